use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chat_provider::{CancelSignal, ProviderProfile, RunEvent, RunProvider, RunRequest};

const CANCEL_WAIT_LIMIT: Duration = Duration::from_secs(5);
const CANCEL_POLL: Duration = Duration::from_millis(5);

pub enum ScriptedOutcome {
    Finish,
    Fail(String),
    WaitForCancel,
}

/// Provider scripted per test. The probe observes the stream handle from the
/// outside: `handle_released` flips once `run` has returned, and
/// `terminal_events` counts terminal emissions (exactly one per run).
pub struct ScriptedProvider {
    chunks: Vec<String>,
    outcome: ScriptedOutcome,
    released: Arc<AtomicBool>,
    terminals: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct StreamProbe {
    released: Arc<AtomicBool>,
    terminals: Arc<AtomicUsize>,
}

impl StreamProbe {
    pub fn handle_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn terminal_events(&self) -> usize {
        self.terminals.load(Ordering::SeqCst)
    }

    pub fn wait_handle_released(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.handle_released() {
                return true;
            }
            thread::sleep(CANCEL_POLL);
        }

        self.handle_released()
    }
}

impl ScriptedProvider {
    pub fn new(chunks: &[&str], outcome: ScriptedOutcome) -> (Arc<Self>, StreamProbe) {
        let released = Arc::new(AtomicBool::new(false));
        let terminals = Arc::new(AtomicUsize::new(0));
        let probe = StreamProbe {
            released: Arc::clone(&released),
            terminals: Arc::clone(&terminals),
        };

        let provider = Arc::new(Self {
            chunks: chunks.iter().map(|chunk| (*chunk).to_string()).collect(),
            outcome,
            released,
            terminals,
        });

        (provider, probe)
    }

    fn run_script(
        &self,
        run_id: u64,
        cancel: &CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        emit(RunEvent::Started { run_id });

        for text in &self.chunks {
            if cancel.load(Ordering::SeqCst) {
                emit(RunEvent::Cancelled { run_id });
                return Ok(());
            }

            emit(RunEvent::Chunk {
                run_id,
                text: text.clone(),
            });
        }

        match &self.outcome {
            ScriptedOutcome::Finish => emit(RunEvent::Finished { run_id }),
            ScriptedOutcome::Fail(error) => emit(RunEvent::Failed {
                run_id,
                error: error.clone(),
            }),
            ScriptedOutcome::WaitForCancel => {
                let deadline = Instant::now() + CANCEL_WAIT_LIMIT;
                loop {
                    if cancel.load(Ordering::SeqCst) {
                        emit(RunEvent::Cancelled { run_id });
                        break;
                    }
                    if Instant::now() >= deadline {
                        emit(RunEvent::Failed {
                            run_id,
                            error: "cancel flag never raised".to_string(),
                        });
                        break;
                    }
                    thread::sleep(CANCEL_POLL);
                }
            }
        }

        Ok(())
    }
}

impl RunProvider for ScriptedProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: "scripted".to_string(),
            model_id: "scripted".to_string(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let terminals = Arc::clone(&self.terminals);
        let mut emit_counted = |event: RunEvent| {
            if event.is_terminal() {
                terminals.fetch_add(1, Ordering::SeqCst);
            }
            emit(event);
        };

        let result = self.run_script(req.run_id, &cancel, &mut emit_counted);
        // run returning is the handle-release point observed by tests.
        self.released.store(true, Ordering::SeqCst);
        result
    }
}
