use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response, Url};

use crate::config::OllamaConfig;
use crate::error::{parse_error_message, OllamaApiError};
use crate::ndjson::NdjsonStreamParser;
use crate::payload::{GenerateChunk, GenerateRequest};
use crate::url::normalize_generate_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct OllamaClient {
    http: Client,
    endpoint: Url,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, OllamaApiError> {
        let endpoint = normalize_generate_url(&config.base_url);
        let endpoint = Url::parse(&endpoint)
            .map_err(|error| OllamaApiError::InvalidBaseUrl(format!("{endpoint}: {error}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OllamaApiError::from)?;

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds a request for this client's configured model.
    pub fn generate_request(&self, prompt: impl Into<String>) -> GenerateRequest {
        GenerateRequest::new(self.config.model.clone(), prompt)
    }

    async fn send(
        &self,
        request: &GenerateRequest,
        stream: bool,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, OllamaApiError> {
        if is_cancelled(cancellation) {
            return Err(OllamaApiError::Cancelled);
        }

        let mut payload = request.clone();
        payload.stream = stream;

        let response = self.http.post(self.endpoint.clone()).json(&payload).send();
        let response = await_or_cancel(response, cancellation)
            .await?
            .map_err(OllamaApiError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .unwrap_or_default();
        Err(OllamaApiError::Status(
            status,
            parse_error_message(status, &body),
        ))
    }

    /// Streams the generate response and invokes `on_chunk` once per decoded
    /// record, in arrival order.
    ///
    /// Returns after the `done=true` record, on decode failure, on transport
    /// failure, or on cancellation. The response body is dropped on every
    /// return path. The cancellation signal is checked before each pump.
    pub async fn stream_with_handler<F>(
        &self,
        request: &GenerateRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_chunk: F,
    ) -> Result<(), OllamaApiError>
    where
        F: FnMut(GenerateChunk),
    {
        let response = self.send(request, true, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = NdjsonStreamParser::default();

        loop {
            if is_cancelled(cancellation) {
                return Err(OllamaApiError::Cancelled);
            }

            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            let chunk = chunk.map_err(OllamaApiError::from)?;

            for record in parser.feed(&chunk)? {
                let done = record.done;
                on_chunk(record);
                if done {
                    return Ok(());
                }
            }
        }

        if let Some(record) = parser.finish()? {
            let done = record.done;
            on_chunk(record);
            if done {
                return Ok(());
            }
        }

        Err(OllamaApiError::UnexpectedEof)
    }

    /// Non-streaming variant: reads exactly one JSON object and returns its
    /// `response` text verbatim.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<String, OllamaApiError> {
        let response = self.send(request, false, cancellation).await?;
        let chunk = await_or_cancel(response.json::<GenerateChunk>(), cancellation)
            .await?
            .map_err(OllamaApiError::from)?;

        Ok(chunk.response)
    }
}

fn is_cancelled(cancellation: Option<&CancellationSignal>) -> bool {
    cancellation.is_some_and(|signal| signal.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, OllamaApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(OllamaApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(OllamaApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::{await_or_cancel, OllamaClient};
    use crate::config::OllamaConfig;
    use crate::error::OllamaApiError;

    #[test]
    fn new_rejects_unparseable_base_url() {
        let config = OllamaConfig::default().with_base_url("not a url");
        let error = OllamaClient::new(config).expect_err("bad base url should fail");
        assert!(matches!(error, OllamaApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn endpoint_is_normalized_from_base_url() {
        let config = OllamaConfig::default().with_base_url("http://127.0.0.1:11434/");
        let client = OllamaClient::new(config).expect("client should build");
        assert_eq!(
            client.endpoint().as_str(),
            "http://127.0.0.1:11434/api/generate"
        );
    }

    #[test]
    fn generate_request_uses_configured_model() {
        let client =
            OllamaClient::new(OllamaConfig::new("llama3.2")).expect("client should build");
        let request = client.generate_request("hi");
        assert_eq!(request.model, "llama3.2");
        assert_eq!(request.prompt, "hi");
        assert!(request.stream);
    }

    #[tokio::test]
    async fn await_or_cancel_returns_cancelled_when_signal_raised() {
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::Release);

        let result = await_or_cancel(
            tokio::time::sleep(std::time::Duration::from_secs(60)),
            Some(&cancel),
        )
        .await;

        assert!(matches!(result, Err(OllamaApiError::Cancelled)));
    }

    #[tokio::test]
    async fn await_or_cancel_passes_output_through_without_signal() {
        let result = await_or_cancel(async { 7u32 }, None).await;
        assert!(matches!(result, Ok(7)));
    }
}
