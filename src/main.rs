use std::io;
use std::process::ExitCode;
use std::sync::mpsc;

use ollama_chat::app::Session;
use ollama_chat::providers;
use ollama_chat::runtime::RunHost;
use ollama_chat::tui::{self, UiState};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("ollama_chat: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> io::Result<()> {
    let provider = providers::provider_from_env().map_err(io::Error::other)?;

    let (event_sender, event_receiver) = mpsc::channel();
    let mut host = RunHost::new(provider, event_sender);
    let mut session = Session::new();
    let mut ui = UiState::from_env();

    tui::install_panic_hook();
    let mut terminal = tui::init_terminal()?;
    let result = tui::run_event_loop(
        &mut terminal,
        &mut session,
        &mut ui,
        &mut host,
        &event_receiver,
    );
    let restored = tui::restore_terminal(&mut terminal);

    result.and(restored)
}
