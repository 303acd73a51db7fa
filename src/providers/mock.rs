use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use chat_provider::{CancelSignal, ProviderProfile, RunEvent, RunProvider, RunRequest};

pub const MOCK_PROVIDER_ID: &str = "mock";

/// Deterministic offline provider for local runs and demos.
///
/// Streams a fixed reply token by token with small delays so streaming,
/// formatting, and cancellation behavior can be exercised without a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProvider {
    chunks: Vec<String>,
}

impl MockProvider {
    pub fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    const RUN_DELAY_MS: u64 = 200;
    const TOKEN_DELAY_MS: u64 = 40;
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            chunks: vec![
                "Hello! ".to_string(),
                "Here is what this client can show. ".to_string(),
                "1. Replies stream in token by token. ".to_string(),
                "2. Sentences break onto their own lines. ".to_string(),
                "- Lists get a paragraph break before them. ".to_string(),
                "Scroll stays pinned to the newest line unless you scroll away. ".to_string(),
                "That's the whole tour.".to_string(),
            ],
        }
    }
}

impl RunProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: MOCK_PROVIDER_ID.to_string(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;
        let _ = req.prompt;

        emit(RunEvent::Started { run_id });
        thread::sleep(Duration::from_millis(MockProvider::RUN_DELAY_MS));

        for chunk in &self.chunks {
            if cancel.load(Ordering::SeqCst) {
                emit(RunEvent::Cancelled { run_id });
                return Ok(());
            }

            let mut pending_token = String::new();
            for ch in chunk.chars() {
                pending_token.push(ch);

                if ch == ' ' {
                    emit(RunEvent::Chunk {
                        run_id,
                        text: std::mem::take(&mut pending_token),
                    });
                    thread::sleep(Duration::from_millis(MockProvider::TOKEN_DELAY_MS));
                }
            }

            if !pending_token.is_empty() {
                if cancel.load(Ordering::SeqCst) {
                    emit(RunEvent::Cancelled { run_id });
                    return Ok(());
                }

                emit(RunEvent::Chunk {
                    run_id,
                    text: pending_token,
                });
                thread::sleep(Duration::from_millis(MockProvider::TOKEN_DELAY_MS));
            }
        }

        if cancel.load(Ordering::SeqCst) {
            emit(RunEvent::Cancelled { run_id });
        } else {
            emit(RunEvent::Finished { run_id });
        }

        Ok(())
    }
}
