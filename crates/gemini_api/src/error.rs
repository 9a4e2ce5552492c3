use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiApiError {
    #[error("API key is required")]
    MissingApiKey,
    #[error("API key is not a valid header value")]
    MalformedApiKey,
    #[error("invalid request payload: {0}")]
    InvalidRequestPayload(String),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} {message}")]
    Status { status: StatusCode, message: String },
    #[error("serialization error: {0}")]
    Serde(#[from] JsonError),
    #[error("prompt was blocked: {reason}")]
    PromptBlocked { reason: String },
    #[error("{0}")]
    Unknown(String),
}

/// Error body shape returned by the Gemini API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
    pub status: Option<String>,
}

impl ErrorPayloadFields {
    pub fn message_or_status(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().and_then(non_empty_string) {
            return Some(message.to_owned());
        }
        self.status
            .as_deref()
            .and_then(non_empty_string)
            .map(ToOwned::to_owned)
    }
}

/// Extracts the most useful human-readable message from an error response.
///
/// Prefers the structured `error.message` field, then `error.status`, then the
/// raw body, then the canonical reason for the status code.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.value.and_then(|value| value.message_or_status()) {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
