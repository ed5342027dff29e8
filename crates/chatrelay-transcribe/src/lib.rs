//! Speech-to-text relay.
//!
//! Provides a trait-based abstraction over a hosted transcription service,
//! the job/status types it reports, an AssemblyAI client, and the relay that
//! stages uploaded audio in a scoped temporary file.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod assemblyai;
pub mod error;
pub mod relay;

pub use assemblyai::AssemblyAiClient;
pub use error::TranscriptionError;
pub use relay::TranscriptionRelay;

// =============================================================================
// Result types
// =============================================================================

/// Lifecycle state of a transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    #[serde(alias = "failed")]
    Error,
}

impl TranscriptStatus {
    /// Completed or failed; no further progress will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TranscriptStatus::Completed | TranscriptStatus::Error)
    }
}

/// A transcription job as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub id: Option<String>,
    pub status: TranscriptStatus,
    #[serde(default)]
    pub text: Option<String>,
    /// Some service versions report the text under this name instead.
    #[serde(default)]
    pub transcript: Option<String>,
    /// Failure reason when `status` is `error`.
    #[serde(default)]
    pub error: Option<String>,
}

impl Transcript {
    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            id: None,
            status: TranscriptStatus::Completed,
            text: Some(text.into()),
            transcript: None,
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            id: None,
            status: TranscriptStatus::Error,
            text: None,
            transcript: None,
            error: Some(reason.into()),
        }
    }

    /// Text from whichever field is populated, preferring `text`.
    pub fn extracted_text(&self) -> Option<&str> {
        [self.text.as_deref(), self.transcript.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
    }
}

// =============================================================================
// Trait
// =============================================================================

/// Service that turns an audio file into a finished transcript.
///
/// Implementations return once the job reaches a terminal status; a job that
/// ended in `error` is an `Ok` transcript, not an `Err`. `Err` is reserved for
/// failures to reach or talk to the service.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript, TranscriptionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal() {
        assert!(!TranscriptStatus::Queued.is_terminal());
        assert!(!TranscriptStatus::Processing.is_terminal());
        assert!(TranscriptStatus::Completed.is_terminal());
        assert!(TranscriptStatus::Error.is_terminal());
    }

    #[test]
    fn test_status_accepts_failed_alias() {
        let status: TranscriptStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, TranscriptStatus::Error);
        let status: TranscriptStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, TranscriptStatus::Error);
    }

    #[test]
    fn test_transcript_deserializes_service_payload() {
        let raw = r#"{
            "id": "abc123",
            "status": "completed",
            "text": "hello world",
            "words": [],
            "audio_duration": 2
        }"#;
        let t: Transcript = serde_json::from_str(raw).unwrap();
        assert_eq!(t.id.as_deref(), Some("abc123"));
        assert_eq!(t.status, TranscriptStatus::Completed);
        assert_eq!(t.extracted_text(), Some("hello world"));
    }

    #[test]
    fn test_extracted_text_falls_back_to_transcript_field() {
        let t: Transcript =
            serde_json::from_str(r#"{"status": "completed", "text": "", "transcript": "alt"}"#)
                .unwrap();
        assert_eq!(t.extracted_text(), Some("alt"));
    }

    #[test]
    fn test_extracted_text_none_when_empty() {
        let t: Transcript = serde_json::from_str(r#"{"status": "completed", "text": null}"#).unwrap();
        assert_eq!(t.extracted_text(), None);
        assert_eq!(Transcript::failed("bad audio").extracted_text(), None);
    }
}
