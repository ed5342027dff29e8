//! Transcription relay: stage uploaded audio, transcribe, clean up.
//!
//! The audio is written to a `NamedTempFile` that lives only for the
//! duration of [`TranscriptionRelay::relay`]; it is removed when dropped, on
//! success, on error and on unwind.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::TranscriptionError;
use crate::{TranscriptStatus, TranscriptionService};

/// Longest file extension carried over to the temporary file.
const MAX_SUFFIX_LEN: usize = 10;

pub struct TranscriptionRelay {
    service: Arc<dyn TranscriptionService>,
    temp_dir: Option<PathBuf>,
}

impl TranscriptionRelay {
    pub fn new(service: Arc<dyn TranscriptionService>) -> Self {
        Self {
            service,
            temp_dir: None,
        }
    }

    /// Stage temporary files under `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Transcribe an uploaded audio payload.
    ///
    /// Returns the transcribed text, or an empty string when the job failed
    /// or produced no text. Only staging and transport failures are errors.
    pub async fn relay(&self, audio: &[u8], filename: &str) -> Result<String, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyPayload);
        }

        let staged = self.stage(audio, filename)?;
        tracing::info!(
            filename = %filename,
            bytes = audio.len(),
            path = %staged.path().display(),
            "Audio staged for transcription"
        );

        let transcript = self.service.transcribe(staged.path()).await?;

        let text = match transcript.status {
            TranscriptStatus::Completed => match transcript.extracted_text() {
                Some(text) => text.to_string(),
                None => {
                    tracing::warn!("Transcript completed without text");
                    String::new()
                }
            },
            TranscriptStatus::Error => {
                tracing::warn!(
                    reason = transcript.error.as_deref().unwrap_or("unknown"),
                    "Transcription failed"
                );
                String::new()
            }
            status => {
                tracing::warn!(?status, "Transcription returned before finishing");
                String::new()
            }
        };

        tracing::info!(status = ?transcript.status, text_len = text.len(), "Transcription relayed");
        Ok(text)
    }

    fn stage(&self, audio: &[u8], filename: &str) -> Result<NamedTempFile, TranscriptionError> {
        let suffix = suffix_for(filename);
        let mut builder = tempfile::Builder::new();
        builder.prefix("chatrelay-audio-").suffix(&suffix);

        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(audio)?;
        file.flush()?;
        Ok(file)
    }
}

/// `.ext` from the client filename, or empty if it has no usable extension.
fn suffix_for(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_SUFFIX_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::Transcript;

    enum Outcome {
        Finished(Transcript),
        TransportError,
    }

    /// Records the staged path and whether the file existed during the call.
    struct FakeService {
        outcome: Outcome,
        seen: Mutex<Option<(PathBuf, bool, Vec<u8>)>>,
    }

    impl FakeService {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(None),
            })
        }

        fn seen(&self) -> (PathBuf, bool, Vec<u8>) {
            self.seen.lock().unwrap().clone().expect("service was not called")
        }
    }

    #[async_trait]
    impl TranscriptionService for FakeService {
        async fn transcribe(&self, audio_path: &Path) -> Result<Transcript, TranscriptionError> {
            let contents = std::fs::read(audio_path).unwrap_or_default();
            *self.seen.lock().unwrap() =
                Some((audio_path.to_path_buf(), audio_path.exists(), contents));
            match &self.outcome {
                Outcome::Finished(t) => Ok(t.clone()),
                Outcome::TransportError => {
                    Err(TranscriptionError::Transport("connection reset".to_string()))
                }
            }
        }
    }

    fn relay_with(service: Arc<FakeService>, dir: &Path) -> TranscriptionRelay {
        TranscriptionRelay::new(service).with_temp_dir(dir)
    }

    #[tokio::test]
    async fn test_completed_returns_text_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let service = FakeService::new(Outcome::Finished(Transcript::completed("ok")));
        let relay = relay_with(Arc::clone(&service), dir.path());

        let text = relay.relay(b"fake-audio", "note.m4a").await.unwrap();
        assert_eq!(text, "ok");

        let (path, existed, contents) = service.seen();
        assert!(existed);
        assert_eq!(contents, b"fake-audio");
        assert_eq!(path.extension().and_then(OsStr::to_str), Some("m4a"));
        assert!(path.starts_with(dir.path()));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_error_status_returns_empty_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let service = FakeService::new(Outcome::Finished(Transcript::failed("unsupported codec")));
        let relay = relay_with(Arc::clone(&service), dir.path());

        let text = relay.relay(b"noise", "clip.wav").await.unwrap();
        assert_eq!(text, "");
        assert!(!service.seen().0.exists());
    }

    #[tokio::test]
    async fn test_completed_without_text_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut transcript = Transcript::completed("");
        transcript.text = None;
        let service = FakeService::new(Outcome::Finished(transcript));
        let relay = relay_with(Arc::clone(&service), dir.path());

        assert_eq!(relay.relay(b"silence", "quiet.wav").await.unwrap(), "");
        assert!(!service.seen().0.exists());
    }

    #[tokio::test]
    async fn test_alternate_text_field_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let transcript: Transcript =
            serde_json::from_str(r#"{"status": "completed", "transcript": "from alt field"}"#)
                .unwrap();
        let service = FakeService::new(Outcome::Finished(transcript));
        let relay = relay_with(service, dir.path());

        assert_eq!(relay.relay(b"x", "a.mp3").await.unwrap(), "from alt field");
    }

    #[tokio::test]
    async fn test_non_terminal_status_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let transcript: Transcript =
            serde_json::from_str(r#"{"status": "processing"}"#).unwrap();
        let service = FakeService::new(Outcome::Finished(transcript));
        let relay = relay_with(service, dir.path());

        assert_eq!(relay.relay(b"x", "a.mp3").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_transport_error_is_fatal_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let service = FakeService::new(Outcome::TransportError);
        let relay = relay_with(Arc::clone(&service), dir.path());

        let result = relay.relay(b"audio", "voice.webm").await;
        assert!(matches!(result, Err(TranscriptionError::Transport(_))));

        let (path, existed, _) = service.seen();
        assert!(existed);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_no_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        for outcome in [
            Outcome::Finished(Transcript::completed("a")),
            Outcome::Finished(Transcript::failed("b")),
            Outcome::TransportError,
        ] {
            let relay = relay_with(FakeService::new(outcome), dir.path());
            let _ = relay.relay(b"audio", "clip.ogg").await;
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_payload_rejected_before_call() {
        let dir = tempfile::tempdir().unwrap();
        let service = FakeService::new(Outcome::Finished(Transcript::completed("x")));
        let relay = relay_with(Arc::clone(&service), dir.path());

        assert!(matches!(
            relay.relay(b"", "empty.wav").await,
            Err(TranscriptionError::EmptyPayload)
        ));
        assert!(service.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_temp_dir_is_io_error() {
        let service = FakeService::new(Outcome::Finished(Transcript::completed("x")));
        let relay = TranscriptionRelay::new(service).with_temp_dir("/nonexistent/chatrelay-tmp");
        assert!(matches!(
            relay.relay(b"audio", "a.wav").await,
            Err(TranscriptionError::Io(_))
        ));
    }

    #[test]
    fn test_suffix_for() {
        assert_eq!(suffix_for("recording.m4a"), ".m4a");
        assert_eq!(suffix_for("Voice.WAV"), ".wav");
        assert_eq!(suffix_for("archive.tar.gz"), ".gz");
        assert_eq!(suffix_for("noext"), "");
        assert_eq!(suffix_for(""), "");
        assert_eq!(suffix_for("../../etc/passwd"), "");
        assert_eq!(suffix_for("weird.a/b"), "");
        assert_eq!(suffix_for("clip.verylongextension"), "");
    }
}
