//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, the upload size limit,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use chatrelay_core::error::RelayError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Browser clients are served from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/transcribe", post(handlers::transcribe))
        .route("/history/{user_id}", get(handlers::history))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured host and port.
pub async fn start_server(state: AppState) -> Result<(), RelayError> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| RelayError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
