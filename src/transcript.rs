use chat_provider::RunId;
use unicode_width::UnicodeWidthStr;

const USER_LABEL: &str = "🧋 ";
const ASSISTANT_LABEL: &str = "🦙 ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation.
///
/// An assistant turn stays open (`streaming == true`) while its run is
/// producing fragments; it is mutated in place and never again after close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub streaming: bool,
    pub run_id: Option<RunId>,
}

/// Append/mutate-last ordered log of conversation turns.
///
/// At most one turn is open at a time and it is always the last element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::User,
            text: text.into(),
            streaming: false,
            run_id: None,
        });
    }

    /// Opens an empty assistant turn for `run_id` unless one already exists.
    pub fn begin_assistant(&mut self, run_id: RunId) {
        if self.assistant_turn_index(run_id).is_some() {
            return;
        }

        self.turns.push(Turn {
            role: Role::Assistant,
            text: String::new(),
            streaming: true,
            run_id: Some(run_id),
        });
    }

    /// Appends a closed assistant turn, used when a run never opened.
    pub fn push_assistant_error(&mut self, message: &str) {
        self.turns.push(Turn {
            role: Role::Assistant,
            text: format!("Error - {message}"),
            streaming: false,
            run_id: None,
        });
    }

    /// Returns the accumulated text of the assistant turn owned by `run_id`.
    pub fn text_for_run(&self, run_id: RunId) -> Option<&str> {
        self.assistant_turn_index(run_id)
            .map(|index| self.turns[index].text.as_str())
    }

    pub fn append_for_run(&mut self, run_id: RunId, text: &str) {
        if let Some(index) = self.assistant_turn_index(run_id) {
            self.turns[index].text.push_str(text);
        }
    }

    pub fn close_for_run(&mut self, run_id: RunId) {
        if let Some(index) = self.assistant_turn_index(run_id) {
            self.turns[index].streaming = false;
        }
    }

    /// Marks the run's turn failed: an empty turn is replaced by the error
    /// text, a partially streamed turn keeps its text with an error suffix.
    pub fn fail_for_run(&mut self, run_id: RunId, message: &str) {
        if let Some(index) = self.assistant_turn_index(run_id) {
            let turn = &mut self.turns[index];
            if turn.text.is_empty() {
                turn.text = format!("Error - {message}");
            } else {
                if !turn.text.ends_with('\n') {
                    turn.text.push('\n');
                }
                turn.text.push_str(&format!("Error - {message}"));
            }
            turn.streaming = false;
        }
    }

    fn assistant_turn_index(&self, run_id: RunId) -> Option<usize> {
        self.turns
            .iter()
            .rposition(|turn| turn.role == Role::Assistant && turn.run_id == Some(run_id))
    }

    /// Renders the transcript to a flat sequence of display lines.
    ///
    /// Each turn's text is word-wrapped to `width`, explicit line breaks are
    /// preserved, and turns are separated by a blank line.
    pub fn display_lines(&self, width: usize) -> Vec<String> {
        let mut lines = Vec::new();

        for turn in &self.turns {
            let label = match turn.role {
                Role::User => USER_LABEL,
                Role::Assistant => ASSISTANT_LABEL,
            };
            let text = if turn.text.is_empty() {
                label.trim_end().to_string()
            } else {
                format!("{label}{}", turn.text)
            };

            for segment in text.split('\n') {
                lines.extend(wrap_segment(segment, width));
            }
            lines.push(String::new());
        }

        lines
    }
}

fn wrap_segment(segment: &str, width: usize) -> Vec<String> {
    if width == 0 || segment.width() <= width {
        return vec![segment.to_string()];
    }

    let mut words = segment.split_whitespace();
    let Some(first) = words.next() else {
        return vec![segment.to_string()];
    };

    let mut wrapped = Vec::new();
    let mut current = first.to_string();

    for word in words {
        if current.width() + 1 + word.width() > width {
            wrapped.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }

    wrapped.push(current);
    wrapped
}
