use chat_provider::RunId;

use crate::format::format_fragment;
use crate::transcript::Transcript;

/// Session controller state. Exactly one request may be outstanding.
///
/// A failed run is local to its turn: the error is rendered into the
/// transcript and the controller returns straight to `Idle`, so there is no
/// resting failure state between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    AwaitingResponse { run_id: RunId },
    Streaming { run_id: RunId },
    Exiting,
}

/// Host-side operations the session delegates run control to.
pub trait HostOps {
    fn start_run(&mut self, prompt: String) -> Result<RunId, String>;
    fn cancel_run(&mut self, run_id: RunId);
}

/// Conversation state machine: owns the transcript and applies run lifecycle
/// events in strict arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub mode: Mode,
    pub transcript: Transcript,
    pub should_exit: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            transcript: Transcript::new(),
            should_exit: false,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.mode,
            Mode::AwaitingResponse { .. } | Mode::Streaming { .. }
        )
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.mode, Mode::Streaming { .. })
    }

    /// Submits a prompt. Returns true when the input was consumed.
    ///
    /// Empty input is rejected silently and submissions while a run is
    /// outstanding are ignored without touching the transcript.
    pub fn on_submit(&mut self, raw_input: &str, host: &mut dyn HostOps) -> bool {
        let prompt = raw_input.trim();
        if prompt.is_empty() || self.mode != Mode::Idle {
            return false;
        }

        match host.start_run(prompt.to_string()) {
            Ok(run_id) => {
                self.transcript.push_user(prompt);
                self.transcript.begin_assistant(run_id);
                self.mode = Mode::AwaitingResponse { run_id };
            }
            Err(error) => {
                self.transcript.push_user(prompt);
                self.transcript.push_assistant_error(&error);
                self.mode = Mode::Idle;
            }
        }

        true
    }

    /// Cancels any outstanding run and marks the session for exit. The host
    /// raises the run's cancel flag; the worker closes the stream before its
    /// terminal event.
    pub fn on_cancel_and_exit(&mut self, host: &mut dyn HostOps) {
        match self.mode {
            Mode::AwaitingResponse { run_id } | Mode::Streaming { run_id } => {
                host.cancel_run(run_id);
            }
            Mode::Idle | Mode::Exiting => {}
        }

        self.mode = Mode::Exiting;
        self.should_exit = true;
    }

    pub fn on_run_started(&mut self, run_id: RunId) {
        if self.mode != (Mode::AwaitingResponse { run_id }) {
            return;
        }

        self.mode = Mode::Streaming { run_id };
    }

    /// Applies one decoded fragment: the fragment is formatted against the
    /// text accumulated so far, then appended to the run's open turn.
    pub fn on_run_chunk(&mut self, run_id: RunId, text: &str) {
        if !self.is_session_run(run_id) {
            return;
        }

        let Some(existing) = self.transcript.text_for_run(run_id) else {
            return;
        };
        let formatted = format_fragment(existing, text);
        self.transcript.append_for_run(run_id, &formatted);
    }

    pub fn on_run_finished(&mut self, run_id: RunId) {
        if !self.is_session_run(run_id) {
            return;
        }

        self.transcript.close_for_run(run_id);
        self.mode = Mode::Idle;
    }

    pub fn on_run_failed(&mut self, run_id: RunId, error: &str) {
        if !self.is_session_run(run_id) {
            return;
        }

        self.transcript.fail_for_run(run_id, error);
        self.mode = Mode::Idle;
    }

    pub fn on_run_cancelled(&mut self, run_id: RunId) {
        if self.mode == Mode::Exiting {
            // Exit-path cancellation: the turn is closed for completeness,
            // the process is already tearing down.
            self.transcript.close_for_run(run_id);
            return;
        }

        if !self.is_session_run(run_id) {
            return;
        }

        self.transcript.close_for_run(run_id);
        self.mode = Mode::Idle;
    }

    fn is_session_run(&self, run_id: RunId) -> bool {
        matches!(
            self.mode,
            Mode::AwaitingResponse { run_id: active } | Mode::Streaming { run_id: active }
                if active == run_id
        )
    }
}
