//! Hosted chat model client.
//!
//! `ChatModel` is the seam the orchestrator calls; `OpenAiCompatibleClient`
//! talks to any OpenAI-style `/chat/completions` endpoint (OpenRouter by
//! default).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use chatrelay_core::config::ModelConfig;

use crate::error::ChatError;
use crate::history::PromptMessage;

/// Token accounting reported by the model API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// A generated reply plus the metadata that came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// A hosted language model that turns a message list into one reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<Completion, ChatError>;
}

/// Client for OpenAI-compatible chat completion APIs.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, messages: &[PromptMessage]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_api().to_string(),
                    content: vec![ContentPart::Text {
                        text: m.text.clone(),
                    }],
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<Completion, ChatError> {
        let body = self.build_request(messages);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::ModelCall(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable error body>".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::ModelCall(format!("invalid response body: {}", e)))?;

        let completion = extract_completion(parsed)?;
        tracing::debug!(
            model = completion.model.as_deref().unwrap_or("unknown"),
            reply_len = completion.text.len(),
            "Model reply received"
        );
        Ok(completion)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_completion(response: ChatCompletionResponse) -> Result<Completion, ChatError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ChatError::ModelCall("response contained no content".to_string()))?;

    Ok(Completion {
        text,
        model: response.model,
        usage: response.usage,
    })
}

fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());
    ChatError::ModelCall(format!("{}: {}", status, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::types::Role;

    fn client(base_url: &str) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(&ModelConfig {
            base_url: base_url.to_string(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
        })
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(
            client("https://openrouter.ai/api/v1").endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            client("http://localhost:8080/v1/").endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            PromptMessage::user("hi"),
            PromptMessage {
                role: Role::Assistant,
                text: "yo".to_string(),
            },
        ];
        let body = serde_json::to_value(client("http://x").build_request(&messages)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                    {"role": "assistant", "content": [{"type": "text", "text": "yo"}]}
                ]
            })
        );
    }

    #[test]
    fn test_extract_completion() {
        let raw = r#"{
            "id": "gen-1",
            "model": "google/gemini-flash-1.5-8b-exp",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let completion = extract_completion(parsed).unwrap();

        assert_eq!(completion.text, "Hello!");
        assert_eq!(
            completion.model.as_deref(),
            Some("google/gemini-flash-1.5-8b-exp")
        );
        assert_eq!(completion.usage.unwrap().total_tokens, 5);
    }

    #[test]
    fn test_extract_completion_without_choices() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            extract_completion(parsed),
            Err(ChatError::ModelCall(_))
        ));
    }

    #[test]
    fn test_extract_completion_null_content() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(extract_completion(parsed).is_err());
    }

    #[test]
    fn test_map_http_error_uses_api_message() {
        let err = map_http_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "No auth credentials found", "code": 401}}"#,
        );
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("No auth credentials found"));
    }

    #[test]
    fn test_map_http_error_falls_back_to_raw_body() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_model_call_error() {
        // Port 9 (discard) on localhost is not an HTTP server.
        let result = client("http://127.0.0.1:9").complete(&[PromptMessage::user("hi")]).await;
        assert!(matches!(result, Err(ChatError::ModelCall(_))));
    }
}
