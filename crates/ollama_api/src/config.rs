use std::time::Duration;

use crate::url::DEFAULT_OLLAMA_BASE_URL;

/// Default model requested when none is configured.
pub const DEFAULT_MODEL_ID: &str = "llama3.2";

/// Transport configuration for Ollama generate requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    /// Base URL for the Ollama server.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Optional request timeout. None keeps the wait unbounded.
    pub timeout: Option<Duration>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_MODEL_ID.to_string(),
            timeout: None,
        }
    }
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
