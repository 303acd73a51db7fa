use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OllamaApiError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0} {1}")]
    Status(StatusCode, String),

    #[error("malformed stream record: {record}: {source}")]
    Decode {
        record: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stream ended before a terminal record")]
    UnexpectedEof,

    #[error("request was cancelled")]
    Cancelled,

    #[error("{0}")]
    Runtime(String),
}

impl OllamaApiError {
    /// Returns true for the cancellation sentinel, which callers treat as a
    /// lifecycle outcome rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

/// Extracts a human-readable message from a non-success response body.
///
/// Ollama reports failures as `{"error": "..."}`; anything else falls back
/// to the raw body or the status reason phrase.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.error.filter(|message| !message.is_empty()) {
            return message;
        }
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
