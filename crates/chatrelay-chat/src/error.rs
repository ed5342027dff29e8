//! Error types for chat turn handling.

/// Errors from the chat pipeline.
///
/// Only `EmptyMessage`, `MessageTooLong` and `ModelCall` ever reach a caller
/// of [`crate::ChatOrchestrator::handle_turn`]; store failures there are
/// logged and absorbed.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("model call failed: {0}")]
    ModelCall(String),
    #[error("failed to read conversation history: {0}")]
    StoreRead(String),
    #[error("failed to persist conversation turns: {0}")]
    StoreWrite(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(4000).to_string(),
            "message exceeds maximum length of 4000 characters"
        );
        assert_eq!(
            ChatError::ModelCall("401 Unauthorized".to_string()).to_string(),
            "model call failed: 401 Unauthorized"
        );
        assert_eq!(
            ChatError::StoreRead("locked".to_string()).to_string(),
            "failed to read conversation history: locked"
        );
        assert_eq!(
            ChatError::StoreWrite("disk full".to_string()).to_string(),
            "failed to persist conversation turns: disk full"
        );
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::ModelCall("x".to_string()));
        assert!(dbg.contains("ModelCall"));
    }
}
