use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use chat_provider::{RunEvent, RunId, RunProvider, RunRequest};

use crate::app::HostOps;

struct ActiveRun {
    run_id: RunId,
    cancel: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

/// Executes provider runs on a worker thread and forwards their lifecycle
/// events through a channel drained by the single UI loop.
///
/// One run is active at a time. Events for a run are sent in provider order;
/// the worker guarantees exactly one terminal event per run even when the
/// provider misbehaves.
pub struct RunHost {
    events: Sender<RunEvent>,
    provider: Arc<dyn RunProvider>,
    next_run_id: AtomicU64,
    active_run: Mutex<Option<ActiveRun>>,
}

impl RunHost {
    pub fn new(provider: Arc<dyn RunProvider>, events: Sender<RunEvent>) -> Arc<Self> {
        Arc::new(Self {
            events,
            provider,
            next_run_id: AtomicU64::new(1),
            active_run: Mutex::new(None),
        })
    }

    fn start_run_internal(self: &Arc<Self>, prompt: String) -> Result<RunId, String> {
        let mut active_run = self.lock_active_run();
        if active_run.is_some() {
            return Err("Run already active".to_string());
        }

        let run_id = self.next_run_id.fetch_add(1, Ordering::SeqCst);
        let cancel = Arc::new(AtomicBool::new(false));
        let request = RunRequest { run_id, prompt };
        let join_handle = self.spawn_worker(request, Arc::clone(&cancel))?;

        *active_run = Some(ActiveRun {
            run_id,
            cancel,
            join_handle: Some(join_handle),
        });

        Ok(run_id)
    }

    fn spawn_worker(
        self: &Arc<Self>,
        request: RunRequest,
        cancel: Arc<AtomicBool>,
    ) -> Result<JoinHandle<()>, String> {
        let run_id = request.run_id;
        let host = Arc::clone(self);
        thread::Builder::new()
            .name(format!("ollama-chat-run-{run_id}"))
            .spawn(move || host.run_worker(request, cancel))
            .map_err(|error| format!("Failed to spawn run worker: {error}"))
    }

    fn run_worker(self: Arc<Self>, request: RunRequest, cancel: Arc<AtomicBool>) {
        let run_id = request.run_id;

        let terminal_emitted = Arc::new(AtomicBool::new(false));
        let terminal_emitted_for_emit = Arc::clone(&terminal_emitted);
        let events = self.events.clone();
        let mut emit = move |event: RunEvent| {
            if event.is_terminal() {
                terminal_emitted_for_emit.store(true, Ordering::SeqCst);
            }

            // A closed receiver means the UI loop is gone; nothing to do.
            let _ = events.send(event);
        };

        let provider = Arc::clone(&self.provider);
        let run_outcome = catch_unwind(AssertUnwindSafe(|| {
            provider.run(request, Arc::clone(&cancel), &mut emit)
        }));

        match run_outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => emit(RunEvent::Failed { run_id, error }),
            Err(_) => emit(RunEvent::Failed {
                run_id,
                error: "Provider panicked".to_string(),
            }),
        }

        if !terminal_emitted.load(Ordering::SeqCst) {
            emit(RunEvent::Failed {
                run_id,
                error: "Provider exited without terminal event".to_string(),
            });
        }
    }

    /// Releases the active run slot after the UI loop has applied the run's
    /// terminal event. A new run cannot start before this is called.
    pub fn finish_run(&self, run_id: RunId) {
        let mut active_run = self.lock_active_run();
        let matches = active_run.as_ref().map(|active| active.run_id) == Some(run_id);
        if !matches {
            return;
        }

        let mut completed = match active_run.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn cancel_run_internal(&self, run_id: RunId) {
        let active_run = self.lock_active_run();
        if let Some(active_run) = active_run.as_ref() {
            if active_run.run_id == run_id {
                active_run.cancel.store(true, Ordering::SeqCst);
            }
        }
    }

    fn lock_active_run(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        lock_unpoisoned(&self.active_run)
    }
}

impl HostOps for Arc<RunHost> {
    fn start_run(&mut self, prompt: String) -> Result<RunId, String> {
        self.start_run_internal(prompt)
    }

    fn cancel_run(&mut self, run_id: RunId) {
        self.cancel_run_internal(run_id);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
