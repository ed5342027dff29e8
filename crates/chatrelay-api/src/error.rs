//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints. Upstream and internal failures are logged in full here and
//! reach the client only as a generic message.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use chatrelay_chat::ChatError;
use chatrelay_transcribe::TranscriptionError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "upstream_error").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 413 Payload Too Large - body exceeds `server.max_upload_bytes`.
    PayloadTooLarge(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - the model or transcription service failed.
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("upload exceeds the maximum allowed size".to_string())
        } else {
            ApiError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::ModelCall(detail) => {
                tracing::error!(error = %detail, "Chat request failed upstream");
                ApiError::Upstream("the chat model is unavailable".to_string())
            }
            ChatError::StoreRead(_) | ChatError::StoreWrite(_) => {
                tracing::error!(error = %err, "Conversation store error");
                ApiError::Internal("conversation store error".to_string())
            }
        }
    }
}

impl From<TranscriptionError> for ApiError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::EmptyPayload => ApiError::BadRequest(err.to_string()),
            TranscriptionError::Transport(detail) => {
                tracing::error!(error = %detail, "Transcription request failed upstream");
                ApiError::Upstream("the transcription service is unavailable".to_string())
            }
            TranscriptionError::Io(e) => {
                tracing::error!(error = %e, "Failed to stage audio");
                ApiError::Internal("failed to stage audio".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, ErrorBody) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_codes() {
        let (status, body) = body_of(ApiError::BadRequest("nope".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "bad_request");
        assert_eq!(body.message, "nope");

        let (status, body) = body_of(ApiError::Upstream("down".to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error, "upstream_error");

        let (status, body) = body_of(ApiError::PayloadTooLarge("big".to_string())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.error, "payload_too_large");

        let (status, body) = body_of(ApiError::Internal("oops".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal_error");
    }

    #[test]
    fn test_chat_error_mapping() {
        assert!(matches!(
            ApiError::from(ChatError::EmptyMessage),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ChatError::MessageTooLong(10)),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ChatError::StoreRead("locked".to_string())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_upstream_detail_not_exposed() {
        let err = ApiError::from(ChatError::ModelCall("401: invalid key sk-abc".to_string()));
        match err {
            ApiError::Upstream(msg) => assert!(!msg.contains("sk-abc")),
            other => panic!("unexpected mapping: {:?}", other),
        }

        let err = ApiError::from(TranscriptionError::Transport("secret detail".to_string()));
        match err {
            ApiError::Upstream(msg) => assert!(!msg.contains("secret")),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_transcription_error_mapping() {
        assert!(matches!(
            ApiError::from(TranscriptionError::EmptyPayload),
            ApiError::BadRequest(_)
        ));
        let io = std::io::Error::new(std::io::ErrorKind::Other, "/tmp/private/path");
        match ApiError::from(TranscriptionError::Io(io)) {
            ApiError::Internal(msg) => assert!(!msg.contains("/tmp")),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }
}
