//! Error types for the transcription relay.

/// Fatal transcription failures.
///
/// A job that finishes with status `error` is not represented here; the relay
/// turns it into an empty transcription.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio payload is empty")]
    EmptyPayload,
    #[error("transcription service error: {0}")]
    Transport(String),
    #[error("temporary audio file error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(err: reqwest::Error) -> Self {
        TranscriptionError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TranscriptionError::EmptyPayload.to_string(), "audio payload is empty");
        assert_eq!(
            TranscriptionError::Transport("connection reset".to_string()).to_string(),
            "transcription service error: connection reset"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: TranscriptionError = io.into();
        assert!(matches!(err, TranscriptionError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }
}
