use std::sync::Arc;
use std::time::Duration;

use chat_provider::{ProviderInitError, RunProvider};
use chat_provider_ollama::{
    OllamaProvider, OllamaProviderConfig, DEFAULT_MODEL_ID, OLLAMA_PROVIDER_ID,
};

mod mock;

pub use mock::{MockProvider, MOCK_PROVIDER_ID};

pub const DEFAULT_PROVIDER_ID: &str = OLLAMA_PROVIDER_ID;

pub const PROVIDER_ENV_VAR: &str = "OLLAMA_CHAT_PROVIDER";
pub const MODEL_ENV_VAR: &str = "OLLAMA_CHAT_MODEL";
pub const BASE_URL_ENV_VAR: &str = "OLLAMA_CHAT_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "OLLAMA_CHAT_TIMEOUT_SEC";
pub const NO_STREAM_ENV_VAR: &str = "OLLAMA_CHAT_NO_STREAM";

pub fn provider_from_env() -> Result<Arc<dyn RunProvider>, ProviderInitError> {
    let provider_id = non_empty_env(PROVIDER_ENV_VAR);
    provider_for_id(provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID))
}

pub fn provider_for_id(provider_id: &str) -> Result<Arc<dyn RunProvider>, ProviderInitError> {
    match provider_id {
        OLLAMA_PROVIDER_ID => {
            let config = ollama_config_from_env()?;
            Ok(Arc::new(OllamaProvider::new(config)?))
        }
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        unknown => Err(ProviderInitError::new(format!(
            "Unsupported provider '{unknown}'. Available providers: {OLLAMA_PROVIDER_ID}, {MOCK_PROVIDER_ID}"
        ))),
    }
}

fn ollama_config_from_env() -> Result<OllamaProviderConfig, ProviderInitError> {
    let model = non_empty_env(MODEL_ENV_VAR).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
    let mut config = OllamaProviderConfig::new(model);

    if let Some(base_url) = non_empty_env(BASE_URL_ENV_VAR) {
        config = config.with_base_url(base_url);
    }

    if let Some(raw) = non_empty_env(TIMEOUT_ENV_VAR) {
        config = config.with_timeout(parse_timeout(&raw)?);
    }

    if env_flag(NO_STREAM_ENV_VAR) {
        config = config.non_streaming();
    }

    Ok(config)
}

fn parse_timeout(raw: &str) -> Result<Duration, ProviderInitError> {
    let seconds: u64 = raw.parse().map_err(|_| {
        ProviderInitError::new(format!(
            "{TIMEOUT_ENV_VAR} must be a positive integer number of seconds, got '{raw}'"
        ))
    })?;

    if seconds == 0 {
        return Err(ProviderInitError::new(format!(
            "{TIMEOUT_ENV_VAR} must be greater than zero"
        )));
    }

    Ok(Duration::from_secs(seconds))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_flag(name: &str) -> bool {
    non_empty_env(name)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}
