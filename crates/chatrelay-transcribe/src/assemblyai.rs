//! AssemblyAI v2 REST client.
//!
//! Uploads the audio file, submits a transcript job for the returned URL,
//! then polls the job until it reaches a terminal status.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use chatrelay_core::config::TranscriptionConfig;

use crate::error::TranscriptionError;
use crate::{Transcript, TranscriptionService};

/// Client for the AssemblyAI transcription API.
#[derive(Clone)]
pub struct AssemblyAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl AssemblyAiClient {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url, path)
    }

    /// Upload raw audio bytes; returns the service-side URL.
    async fn upload(&self, audio: Vec<u8>) -> Result<String, TranscriptionError> {
        let response = self
            .client
            .post(self.url("upload"))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(audio)
            .send()
            .await?;
        let body: UploadResponse = check(response).await?.json().await?;
        Ok(body.upload_url)
    }

    async fn submit(&self, audio_url: String) -> Result<Transcript, TranscriptionError> {
        let response = self
            .client
            .post(self.url("transcript"))
            .header("authorization", &self.api_key)
            .json(&SubmitRequest { audio_url })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn fetch(&self, id: &str) -> Result<Transcript, TranscriptionError> {
        let response = self
            .client
            .get(self.url(&format!("transcript/{}", id)))
            .header("authorization", &self.api_key)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[async_trait]
impl TranscriptionService for AssemblyAiClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript, TranscriptionError> {
        let audio = tokio::fs::read(audio_path).await?;
        let size = audio.len();

        let upload_url = self.upload(audio).await?;
        tracing::debug!(bytes = size, "Audio uploaded");

        let mut transcript = self.submit(upload_url).await?;
        let id = transcript.id.clone().ok_or_else(|| {
            TranscriptionError::Transport("transcript job has no id".to_string())
        })?;
        tracing::debug!(job = %id, status = ?transcript.status, "Transcript job submitted");

        while !transcript.status.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            transcript = self.fetch(&id).await?;
            tracing::trace!(job = %id, status = ?transcript.status, "Transcript job polled");
        }

        tracing::debug!(job = %id, status = ?transcript.status, "Transcript job finished");
        Ok(transcript)
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest {
    audio_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Turn a non-2xx response into a transport error carrying the API message.
async fn check(response: Response) -> Result<Response, TranscriptionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TranscriptionError::Transport(format!(
        "{}: {}",
        status,
        error_message(&body)
    )))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string())
}
