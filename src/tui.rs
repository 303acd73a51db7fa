use std::io::{self, Stdout};
use std::panic;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use unicode_width::UnicodeWidthStr;

use chat_provider::RunEvent;

use crate::app::Session;
use crate::runtime::RunHost;
use crate::scroll::{ScrollPolicy, ScrollState};

const SPINNER_FRAMES: [&str; 3] = ["✨.", "✨.", "✨.."];
const SPINNER_INTERVAL: Duration = Duration::from_millis(500);
const TICK_RATE: Duration = Duration::from_millis(50);
const INPUT_PROMPT: &str = "🧋 > ";
const KEY_SCROLL_LINES: usize = 1;
const WHEEL_SCROLL_LINES: usize = 3;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Render-layer state: the prompt editor, viewport position, and the layout
/// measurements taken during the last draw. Session state stays out of here.
pub struct UiState {
    pub input: Input,
    pub scroll: ScrollState,
    pub policy: ScrollPolicy,
    spinner_frame: usize,
    spinner_advanced_at: Instant,
    pub total_lines: usize,
    pub viewport_height: usize,
    pub wrap_width: usize,
}

impl UiState {
    pub fn new(policy: ScrollPolicy) -> Self {
        Self {
            input: Input::default(),
            scroll: ScrollState::new(),
            policy,
            spinner_frame: 0,
            spinner_advanced_at: Instant::now(),
            total_lines: 0,
            viewport_height: 0,
            wrap_width: 0,
        }
    }

    pub fn from_env() -> Self {
        Self::new(ScrollPolicy::from_env())
    }

    fn advance_spinner(&mut self) {
        if self.spinner_advanced_at.elapsed() >= SPINNER_INTERVAL {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
            self.spinner_advanced_at = Instant::now();
        }
    }

    fn reset_spinner(&mut self) {
        self.spinner_frame = 0;
        self.spinner_advanced_at = Instant::now();
    }
}

pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));
}

pub fn init_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

pub fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()
}

/// Drives the session until exit: one loop iteration drains pending run
/// events, polls for one input event, and redraws.
pub fn run_event_loop(
    terminal: &mut Tui,
    session: &mut Session,
    ui: &mut UiState,
    host: &mut Arc<RunHost>,
    events: &Receiver<RunEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, session, ui))?;

        while let Ok(event) = events.try_recv() {
            apply_run_event(session, ui, host, event);
        }

        if event::poll(TICK_RATE)? {
            match event::read()? {
                Event::Key(key) => handle_key(key, session, ui, host),
                Event::Mouse(mouse) => handle_mouse(mouse, session, ui),
                _ => {}
            }
        }

        if session.is_busy() {
            ui.advance_spinner();
        }

        if session.should_exit {
            return Ok(());
        }
    }
}

/// Applies one run event to the session, releases the host's run slot on a
/// terminal event, and re-evaluates the viewport follow decision.
///
/// The near-bottom check uses the position from before the mutation, so a
/// reader who scrolled back is not yanked forward by new content.
pub fn apply_run_event(
    session: &mut Session,
    ui: &mut UiState,
    host: &Arc<RunHost>,
    event: RunEvent,
) {
    let was_near_bottom = ui.scroll.is_near_bottom(ui.total_lines, ui.viewport_height);
    let terminal_run = event.is_terminal().then(|| event.run_id());

    match event {
        RunEvent::Started { run_id } => session.on_run_started(run_id),
        RunEvent::Chunk { run_id, text } => session.on_run_chunk(run_id, &text),
        RunEvent::Finished { run_id } => session.on_run_finished(run_id),
        RunEvent::Failed { run_id, error } => session.on_run_failed(run_id, &error),
        RunEvent::Cancelled { run_id } => session.on_run_cancelled(run_id),
    }

    if let Some(run_id) = terminal_run {
        host.finish_run(run_id);
    }

    ui.total_lines =
        session.transcript.display_lines(ui.wrap_width).len() + usize::from(session.is_busy());
    ui.scroll
        .follow_content(was_near_bottom, ui.total_lines, ui.viewport_height);
}

pub fn draw(frame: &mut Frame, session: &Session, ui: &mut UiState) {
    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let wrap_width = usize::from(transcript_area.width.saturating_sub(2));
    let mut lines = session.transcript.display_lines(wrap_width);
    if session.is_busy() {
        lines.push(SPINNER_FRAMES[ui.spinner_frame].to_string());
    }

    ui.wrap_width = wrap_width;
    ui.total_lines = lines.len();
    ui.viewport_height = usize::from(transcript_area.height);
    ui.scroll.clamp(ui.total_lines, ui.viewport_height);

    let text: Vec<Line> = lines.into_iter().map(Line::raw).collect();
    frame.render_widget(
        Paragraph::new(text).scroll((ui.scroll.offset as u16, 0)),
        transcript_area,
    );

    let prompt_width = INPUT_PROMPT.width() as u16;
    let [prompt_area, value_area] =
        Layout::horizontal([Constraint::Length(prompt_width), Constraint::Min(1)])
            .areas(input_area);
    frame.render_widget(Paragraph::new(INPUT_PROMPT), prompt_area);

    let input_scroll = ui.input.visual_scroll(usize::from(value_area.width.max(1)));
    frame.render_widget(
        Paragraph::new(ui.input.value()).scroll((0, input_scroll as u16)),
        value_area,
    );
    frame.set_cursor_position((
        value_area.x + ui.input.visual_cursor().saturating_sub(input_scroll) as u16,
        value_area.y,
    ));
}

fn handle_key(key: KeyEvent, session: &mut Session, ui: &mut UiState, host: &mut Arc<RunHost>) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            session.on_cancel_and_exit(host);
        }
        (KeyCode::Enter, _) => {
            if session.on_submit(ui.input.value(), host) {
                ui.input.reset();
                ui.reset_spinner();
                ui.scroll.snap_to_bottom(ui.total_lines, ui.viewport_height);
            }
        }
        (KeyCode::Up, KeyModifiers::NONE) => scroll_up(session, ui, KEY_SCROLL_LINES),
        (KeyCode::Down, KeyModifiers::NONE) => scroll_down(session, ui, KEY_SCROLL_LINES),
        (KeyCode::PageUp, _) => {
            if ui.policy.allows_user_scroll(session.is_streaming()) {
                ui.scroll.page_up(ui.viewport_height);
            }
        }
        (KeyCode::PageDown, _) => {
            if ui.policy.allows_user_scroll(session.is_streaming()) {
                ui.scroll.page_down(ui.total_lines, ui.viewport_height);
            }
        }
        _ => {
            ui.input.handle_event(&Event::Key(key));
        }
    }
}

fn handle_mouse(mouse: MouseEvent, session: &mut Session, ui: &mut UiState) {
    match mouse.kind {
        MouseEventKind::ScrollUp => scroll_up(session, ui, WHEEL_SCROLL_LINES),
        MouseEventKind::ScrollDown => scroll_down(session, ui, WHEEL_SCROLL_LINES),
        _ => {}
    }
}

fn scroll_up(session: &Session, ui: &mut UiState, lines: usize) {
    if ui.policy.allows_user_scroll(session.is_streaming()) {
        ui.scroll.scroll_up(lines);
    }
}

fn scroll_down(session: &Session, ui: &mut UiState, lines: usize) {
    if ui.policy.allows_user_scroll(session.is_streaming()) {
        ui.scroll
            .scroll_down(lines, ui.total_lines, ui.viewport_height);
    }
}
