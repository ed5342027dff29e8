//! Application state shared across all route handlers.
//!
//! AppState holds the configured relays and the conversation store.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use chatrelay_chat::{ChatModel, ChatOrchestrator};
use chatrelay_core::config::RelayConfig;
use chatrelay_storage::ConversationStore;
use chatrelay_transcribe::{TranscriptionRelay, TranscriptionService};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<RelayConfig>,
    /// Chat turn pipeline (history, model, persistence).
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Audio staging and transcription.
    pub transcriber: Arc<TranscriptionRelay>,
    /// Conversation store, used directly for health checks.
    pub store: Arc<dyn ConversationStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the relays from their injected dependencies.
    pub fn new(
        config: RelayConfig,
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ChatModel>,
        transcription: Arc<dyn TranscriptionService>,
    ) -> Self {
        let orchestrator = ChatOrchestrator::new(Arc::clone(&store), model, config.chat.clone());
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            transcriber: Arc::new(TranscriptionRelay::new(transcription)),
            store,
            start_time: Instant::now(),
        }
    }
}
