//! Ollama-backed implementation of the shared `chat_provider` contract.
//!
//! This adapter translates `ollama_api` stream semantics into the
//! deterministic `RunEvent` lifecycle expected by the chat session: one
//! `Started` once the response is open, one `Chunk` per decoded record in
//! arrival order, then exactly one terminal event.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    CancelSignal, ProviderInitError, ProviderProfile, RunEvent, RunProvider, RunRequest,
};
use ollama_api::{GenerateRequest, OllamaApiError, OllamaClient, OllamaConfig};

pub use ollama_api::{DEFAULT_MODEL_ID, DEFAULT_OLLAMA_BASE_URL};

/// Stable provider identifier used by startup selection.
pub const OLLAMA_PROVIDER_ID: &str = "ollama";

/// Runtime configuration for the Ollama provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaProviderConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    /// When false, the full reply is fetched in one round trip and emitted
    /// as a single chunk.
    pub streaming: bool,
}

impl OllamaProviderConfig {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: None,
            timeout: None,
            streaming: true,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn non_streaming(mut self) -> Self {
        self.streaming = false;
        self
    }

    fn into_ollama_config(self) -> OllamaConfig {
        let mut config = OllamaConfig::new(self.model);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn model(&self) -> String;

    fn stream(
        &self,
        request: &GenerateRequest,
        cancel: &CancelSignal,
        on_text: &mut dyn FnMut(String),
    ) -> Result<(), OllamaApiError>;

    fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancelSignal,
    ) -> Result<String, OllamaApiError>;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: OllamaClient,
}

impl DefaultStreamClient {
    fn runtime() -> Result<tokio::runtime::Runtime, OllamaApiError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OllamaApiError::Runtime(format!("failed to initialize tokio runtime: {error}"))
            })
    }
}

impl StreamClient for DefaultStreamClient {
    fn model(&self) -> String {
        self.client.config().model.clone()
    }

    fn stream(
        &self,
        request: &GenerateRequest,
        cancel: &CancelSignal,
        on_text: &mut dyn FnMut(String),
    ) -> Result<(), OllamaApiError> {
        let runtime = Self::runtime()?;
        runtime.block_on(self.client.stream_with_handler(request, Some(cancel), |chunk| {
            if !chunk.response.is_empty() {
                on_text(chunk.response);
            }
        }))
    }

    fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancelSignal,
    ) -> Result<String, OllamaApiError> {
        let runtime = Self::runtime()?;
        runtime.block_on(self.client.generate(request, Some(cancel)))
    }
}

/// `RunProvider` adapter backed by `ollama_api` transport primitives.
pub struct OllamaProvider {
    streaming: bool,
    stream_client: Arc<dyn StreamClient>,
}

impl OllamaProvider {
    /// Creates a provider using real Ollama transport.
    pub fn new(config: OllamaProviderConfig) -> Result<Self, ProviderInitError> {
        let streaming = config.streaming;
        let client = OllamaClient::new(config.into_ollama_config()).map_err(map_init_error)?;

        Ok(Self {
            streaming,
            stream_client: Arc::new(DefaultStreamClient { client }),
        })
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(streaming: bool, stream_client: Arc<dyn StreamClient>) -> Self {
        Self {
            streaming,
            stream_client,
        }
    }
}

impl RunProvider for OllamaProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: OLLAMA_PROVIDER_ID.to_string(),
            model_id: self.stream_client.model(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;

        if cancel.load(Ordering::Acquire) {
            emit(RunEvent::Cancelled { run_id });
            return Ok(());
        }

        let request = GenerateRequest::new(self.stream_client.model(), req.prompt);

        let outcome = if self.streaming {
            emit(RunEvent::Started { run_id });
            let mut on_text = |text: String| emit_chunk(run_id, text, emit);
            self.stream_client.stream(&request, &cancel, &mut on_text)
        } else {
            emit(RunEvent::Started { run_id });
            self.stream_client
                .generate(&request.non_streaming(), &cancel)
                .map(|reply| emit_chunk(run_id, reply, emit))
        };

        match outcome {
            Ok(()) => emit(RunEvent::Finished { run_id }),
            Err(error) if error.is_cancelled() => emit(RunEvent::Cancelled { run_id }),
            Err(error) => emit(RunEvent::Failed {
                run_id,
                error: error.to_string(),
            }),
        }

        Ok(())
    }
}

fn emit_chunk(run_id: u64, text: String, emit: &mut dyn FnMut(RunEvent)) {
    if !text.is_empty() {
        emit(RunEvent::Chunk { run_id, text });
    }
}

fn map_init_error(error: OllamaApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize ollama provider: {error}"))
}
