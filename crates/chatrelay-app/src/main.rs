//! chatrelay binary - composition root.
//!
//! 1. Load `.env`, configuration file, environment and CLI overrides
//! 2. Open the SQLite conversation store
//! 3. Build the model and transcription clients
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

use chatrelay_api::routes;
use chatrelay_api::state::AppState;
use chatrelay_chat::OpenAiCompatibleClient;
use chatrelay_core::config::RelayConfig;
use chatrelay_storage::{ConversationRepository, ConversationStore, Database};
use chatrelay_transcribe::AssemblyAiClient;

use cli::{expand_home, CliArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    let args = CliArgs::parse();

    // Tracing. Starts at info so config loading is logged; the configured
    // level is applied once the config is known, unless RUST_LOG is set.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chatrelay v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = RelayConfig::load_or_default(&config_file).with_env_overrides();
    args.apply_to(&mut config);

    if !from_env {
        filter_handle.reload(EnvFilter::new(&config.server.log_level))?;
    }

    for key in config.missing_credentials() {
        tracing::warn!(key, "Credential not set; requests needing it will fail");
    }

    // Storage.
    let db_path = expand_home(&config.storage.database_path);
    let db = Arc::new(Database::new(&db_path)?);
    let store: Arc<dyn ConversationStore> = Arc::new(ConversationRepository::new(db));
    store.ping()?;
    tracing::info!(path = %db_path.display(), "Conversation store opened");

    // Upstream clients.
    let model = Arc::new(OpenAiCompatibleClient::new(&config.model));
    let transcription = Arc::new(AssemblyAiClient::new(&config.transcription));
    tracing::info!(
        model = %config.model.model,
        model_url = %config.model.base_url,
        transcription_url = %config.transcription.base_url,
        "Upstream clients ready"
    );

    let state = AppState::new(config, store, model, transcription);
    routes::start_server(state).await?;

    Ok(())
}
