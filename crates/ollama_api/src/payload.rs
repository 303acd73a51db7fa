use serde::{Deserialize, Serialize};

/// Canonical request payload shape for the generate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// Default: true.
    #[serde(default = "default_true")]
    pub stream: bool,
}

fn default_true() -> bool {
    true
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: true,
        }
    }

    pub fn non_streaming(mut self) -> Self {
        self.stream = false;
        self
    }
}

/// One decoded record of a generate response.
///
/// Streaming responses are a sequence of these, terminated by `done=true`;
/// non-streaming responses are exactly one with `done=true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}
