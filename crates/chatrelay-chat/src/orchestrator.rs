//! Chat orchestrator: history → prompt → model → persist.
//!
//! Only the model call is fatal. A failed history read continues with an
//! empty history, and a failed write still returns the reply.

use std::sync::Arc;

use chatrelay_core::config::ChatConfig;
use chatrelay_core::types::{StoredTurn, Turn};
use chatrelay_storage::ConversationStore;

use crate::error::ChatError;
use crate::history::assemble_prompt;
use crate::llm::ChatModel;

/// Outcome of one chat turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Generated assistant text.
    pub text: String,
    /// User id the turn was recorded under.
    pub user_id: String,
    /// Stored turns that were sent as context.
    pub context_turns: usize,
    /// Whether both new turns were written to the store.
    pub persisted: bool,
}

/// Coordinates the conversation store and the chat model for one turn.
pub struct ChatOrchestrator {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ChatModel>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ChatModel>,
        config: ChatConfig,
    ) -> Self {
        Self {
            store,
            model,
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Handle one user message and return the assistant's reply.
    ///
    /// `user_id` falls back to the configured default when absent or blank.
    pub async fn handle_turn(
        &self,
        user_id: Option<&str>,
        user_text: &str,
    ) -> Result<ChatReply, ChatError> {
        if user_text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if user_text.chars().count() > self.config.max_message_chars {
            return Err(ChatError::MessageTooLong(self.config.max_message_chars));
        }

        let user_id = self.resolve_user_id(user_id);

        let history = match self.load_history(&user_id, self.config.history_limit).await {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "History unavailable, continuing without it");
                Vec::new()
            }
        };
        let context_turns = history.len();

        let prompt = assemble_prompt(&history, user_text);
        tracing::debug!(user_id = %user_id, messages = prompt.len(), "Prompt assembled");

        let completion = self.model.complete(&prompt).await.map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "Model call failed");
            e
        })?;

        let new_turns = vec![Turn::user(user_text), Turn::assistant(&completion.text)];
        let persisted = match self.persist(&user_id, new_turns).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Reply not persisted");
                false
            }
        };

        tracing::info!(
            user_id = %user_id,
            context_turns,
            reply_len = completion.text.len(),
            persisted,
            "Chat turn completed"
        );

        Ok(ChatReply {
            text: completion.text,
            user_id,
            context_turns,
            persisted,
        })
    }

    /// Read a user's stored history, oldest first.
    ///
    /// Unlike `handle_turn`, store failures are returned to the caller.
    pub async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<(Vec<StoredTurn>, u64), ChatError> {
        let turns = self.load_history(user_id, limit).await?;
        let store = Arc::clone(&self.store);
        let uid = user_id.to_string();
        let total = tokio::task::spawn_blocking(move || store.turn_count(&uid))
            .await
            .map_err(|e| ChatError::StoreRead(e.to_string()))?
            .map_err(|e| ChatError::StoreRead(e.to_string()))?;
        Ok((turns, total))
    }

    fn resolve_user_id(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.config.default_user_id.clone(),
        }
    }

    async fn load_history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>, ChatError> {
        let store = Arc::clone(&self.store);
        let uid = user_id.to_string();
        tokio::task::spawn_blocking(move || store.get_history(&uid, limit))
            .await
            .map_err(|e| ChatError::StoreRead(e.to_string()))?
            .map_err(|e| ChatError::StoreRead(e.to_string()))
    }

    async fn persist(&self, user_id: &str, turns: Vec<Turn>) -> Result<(), ChatError> {
        let store = Arc::clone(&self.store);
        let uid = user_id.to_string();
        tokio::task::spawn_blocking(move || store.append_turns(&uid, &turns))
            .await
            .map_err(|e| ChatError::StoreWrite(e.to_string()))?
            .map_err(|e| ChatError::StoreWrite(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
