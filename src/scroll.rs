//! Viewport follow/hold decisions for the transcript view.

/// Lines of slack within which the viewport still counts as "at the bottom".
pub const FOLLOW_SLACK_LINES: usize = 3;

pub const SCROLL_UNLOCK_ENV_VAR: &str = "OLLAMA_CHAT_SCROLL_UNLOCKED";

/// Current viewport position over the rendered transcript lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub offset: usize,
    pub at_bottom: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            at_bottom: true,
        }
    }
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the viewport sits at or within slack of the newest content.
    pub fn is_near_bottom(&self, total_lines: usize, viewport: usize) -> bool {
        self.offset + viewport + FOLLOW_SLACK_LINES >= total_lines
    }

    pub fn snap_to_bottom(&mut self, total_lines: usize, viewport: usize) {
        self.offset = total_lines.saturating_sub(viewport);
        self.at_bottom = true;
    }

    /// Re-evaluates the offset after content grew. The viewport follows new
    /// content only when it was near the bottom before the mutation;
    /// otherwise the reader's position is left untouched.
    pub fn follow_content(&mut self, was_near_bottom: bool, total_lines: usize, viewport: usize) {
        if was_near_bottom {
            self.snap_to_bottom(total_lines, viewport);
        } else {
            self.at_bottom = false;
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
        self.at_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: usize, total_lines: usize, viewport: usize) {
        let max_offset = total_lines.saturating_sub(viewport);
        self.offset = (self.offset + lines).min(max_offset);
        self.at_bottom = self.offset >= max_offset;
    }

    pub fn page_up(&mut self, viewport: usize) {
        self.scroll_up(viewport.saturating_sub(1).max(1));
    }

    pub fn page_down(&mut self, total_lines: usize, viewport: usize) {
        self.scroll_down(viewport.saturating_sub(1).max(1), total_lines, viewport);
    }

    /// Keeps the offset valid after a resize or content shrink.
    pub fn clamp(&mut self, total_lines: usize, viewport: usize) {
        let max_offset = total_lines.saturating_sub(viewport);
        if self.offset > max_offset || self.at_bottom {
            self.offset = max_offset;
        }
    }
}

/// Whether explicit scroll input is honored while a reply is streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPolicy {
    pub lock_while_streaming: bool,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            lock_while_streaming: true,
        }
    }
}

impl ScrollPolicy {
    pub fn from_env() -> Self {
        let unlocked = std::env::var(SCROLL_UNLOCK_ENV_VAR)
            .map(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(false);

        Self {
            lock_while_streaming: !unlocked,
        }
    }

    pub fn allows_user_scroll(&self, streaming: bool) -> bool {
        !streaming || !self.lock_while_streaming
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_bottom_includes_the_slack_band() {
        let mut scroll = ScrollState::new();
        // 50 total lines, 10 visible: bottom offset is 40.
        scroll.offset = 37;
        assert!(scroll.is_near_bottom(50, 10));

        scroll.offset = 36;
        assert!(!scroll.is_near_bottom(50, 10));
    }

    #[test]
    fn follow_content_snaps_only_when_previously_near_bottom() {
        let mut scroll = ScrollState::new();
        scroll.offset = 38;
        let was_near = scroll.is_near_bottom(50, 10);
        scroll.follow_content(was_near, 55, 10);
        assert_eq!(scroll.offset, 45);
        assert!(scroll.at_bottom);

        let mut held = ScrollState::new();
        held.offset = 5;
        held.at_bottom = false;
        let was_near = held.is_near_bottom(50, 10);
        held.follow_content(was_near, 55, 10);
        assert_eq!(held.offset, 5);
        assert!(!held.at_bottom);
    }

    #[test]
    fn scroll_down_clamps_to_content_end() {
        let mut scroll = ScrollState::new();
        scroll.offset = 38;
        scroll.scroll_down(10, 50, 10);
        assert_eq!(scroll.offset, 40);
        assert!(scroll.at_bottom);
    }

    #[test]
    fn scroll_up_releases_bottom_follow() {
        let mut scroll = ScrollState::new();
        scroll.snap_to_bottom(50, 10);
        scroll.scroll_up(3);
        assert_eq!(scroll.offset, 37);
        assert!(!scroll.at_bottom);
    }

    #[test]
    fn clamp_tracks_bottom_after_resize() {
        let mut scroll = ScrollState::new();
        scroll.snap_to_bottom(50, 10);
        scroll.clamp(50, 20);
        assert_eq!(scroll.offset, 30);
    }

    #[test]
    fn default_policy_locks_scroll_while_streaming() {
        let policy = ScrollPolicy::default();
        assert!(policy.allows_user_scroll(false));
        assert!(!policy.allows_user_scroll(true));
    }

    #[test]
    fn unlocked_policy_honors_scroll_while_streaming() {
        let policy = ScrollPolicy {
            lock_while_streaming: false,
        };
        assert!(policy.allows_user_scroll(true));
    }
}
