//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its input via axum extractors, hands it to the
//! relay in AppState, and returns a JSON response.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field that carries the uploaded audio.
pub const AUDIO_FIELD: &str = "audio_file";

/// Upper bound on `?limit=` for history lookups.
const MAX_HISTORY_LIMIT: usize = 500;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation owner; the configured default is used when absent.
    #[serde(default)]
    pub user_id: Option<String>,
    pub user_input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub turns: Vec<HistoryTurn>,
    /// Number of stored turns for this user, regardless of `limit`.
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub store: String,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat - run one chat turn.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    let reply = state
        .orchestrator
        .handle_turn(req.user_id.as_deref(), &req.user_input)
        .await?;

    Ok(Json(ChatResponse {
        response: reply.text,
    }))
}

// =============================================================================
// Transcription
// =============================================================================

/// POST /transcribe - relay an uploaded audio file to the transcription service.
///
/// Responds 200 with an empty `transcription` when the job itself failed.
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let audio = field.bytes().await?;

        let transcription = state.transcriber.relay(&audio, &filename).await?;
        return Ok(Json(TranscriptionResponse { transcription }));
    }

    Err(ApiError::BadRequest(format!(
        "missing multipart field '{}'",
        AUDIO_FIELD
    )))
}

// =============================================================================
// History
// =============================================================================

/// GET /history/{user_id} - stored turns for a user, oldest first.
pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.orchestrator.config().history_limit)
        .min(MAX_HISTORY_LIMIT);

    let (turns, total) = state.orchestrator.history(&user_id, limit).await?;

    Ok(Json(HistoryResponse {
        user_id,
        turns: turns
            .into_iter()
            .map(|t| HistoryTurn {
                role: t.role,
                text: t.text,
                created_at: t.created_at,
            })
            .collect(),
        total,
    }))
}

// =============================================================================
// Health
// =============================================================================

/// GET /health - liveness plus a store reachability check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = std::sync::Arc::clone(&state.store);
    let store_ok = match tokio::task::spawn_blocking(move || store.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "Store health check task failed");
            false
        }
    };

    Json(HealthResponse {
        status: if store_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        store: if store_ok { "ok" } else { "unavailable" }.to_string(),
    })
}
