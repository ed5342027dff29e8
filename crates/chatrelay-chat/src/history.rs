//! Prompt assembly from stored conversation turns.

use serde::{Deserialize, Serialize};

use chatrelay_core::types::{Role, StoredTurn};

/// One message of the prompt sent to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub text: String,
}

impl PromptMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

/// Merge stored turns with the new user text into the model's message list.
///
/// Stored turns keep their order and have their role normalized to the
/// model vocabulary (`ai` becomes `assistant`). Turns with an unknown role or
/// blank text are skipped, so a fully malformed history degrades to just the
/// new message, which is always last.
pub fn assemble_prompt(stored: &[StoredTurn], user_text: &str) -> Vec<PromptMessage> {
    let mut messages: Vec<PromptMessage> = Vec::with_capacity(stored.len() + 1);

    for turn in stored {
        match turn.role() {
            Some(role) if !turn.text.trim().is_empty() => messages.push(PromptMessage {
                role,
                text: turn.text.clone(),
            }),
            _ => {
                tracing::debug!(role = %turn.role, "Skipping malformed stored turn");
            }
        }
    }

    messages.push(PromptMessage::user(user_text));
    messages
}
