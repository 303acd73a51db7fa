//! Display-oriented shaping of streamed reply fragments.
//!
//! Formatting is applied exactly once per incoming fragment, against the text
//! accumulated so far. It is never re-run over previously appended output;
//! replaying it would double-insert line breaks.

const LIST_MARKERS: [&str; 7] = ["1. ", "2. ", "3. ", "4. ", "5. ", "* ", "- "];

/// Returns the text to append for `fragment`, given the reply text
/// accumulated before it.
///
/// A fragment opening a list item gets a leading line break unless the
/// accumulated text is empty or already ends in one. Otherwise sentence
/// boundaries (`". "`, absent any `".."`) are turned into line breaks.
/// The two rules are mutually exclusive.
pub fn format_fragment(existing: &str, fragment: &str) -> String {
    if starts_with_list_marker(fragment.trim_start()) {
        if !existing.is_empty() && !existing.ends_with('\n') {
            return format!("\n{fragment}");
        }
        return fragment.to_string();
    }

    if fragment.contains(". ") && !fragment.contains("..") {
        return fragment.replace(". ", ".\n");
    }

    fragment.to_string()
}

fn starts_with_list_marker(trimmed: &str) -> bool {
    LIST_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
}

#[cfg(test)]
mod tests {
    use super::format_fragment;

    #[test]
    fn list_marker_with_empty_accumulated_text_gets_no_leading_break() {
        assert_eq!(format_fragment("", "1. first"), "1. first");
    }

    #[test]
    fn list_marker_after_unterminated_text_gets_leading_break() {
        assert_eq!(format_fragment("abc", "2. second"), "\n2. second");
    }

    #[test]
    fn list_marker_after_trailing_newline_gets_no_extra_break() {
        assert_eq!(format_fragment("abc\n", "3. third"), "3. third");
    }

    #[test]
    fn bullet_markers_behave_like_ordinal_markers() {
        assert_eq!(format_fragment("intro", "* point"), "\n* point");
        assert_eq!(format_fragment("intro", "- point"), "\n- point");
    }

    #[test]
    fn marker_detection_ignores_leading_whitespace() {
        assert_eq!(format_fragment("intro", "  1. indented"), "\n  1. indented");
    }

    #[test]
    fn ordinals_past_five_are_not_markers() {
        assert_eq!(format_fragment("intro", "6. six. "), "6.\nsix.\n");
    }

    #[test]
    fn sentence_boundary_becomes_line_break() {
        assert_eq!(format_fragment("x", "Dr. Smith"), "Dr.\nSmith");
    }

    #[test]
    fn every_sentence_boundary_in_the_fragment_breaks() {
        assert_eq!(format_fragment("", "One. Two. Three"), "One.\nTwo.\nThree");
    }

    #[test]
    fn double_dot_suppresses_sentence_splitting() {
        assert_eq!(format_fragment("x", "etc.. and so on. next"), "etc.. and so on. next");
    }

    #[test]
    fn list_rule_wins_over_sentence_rule() {
        // "1. " contains ". " but the fragment is a list item, not a sentence.
        assert_eq!(format_fragment("", "1. first. second"), "1. first. second");
    }

    #[test]
    fn plain_fragment_passes_through_unchanged() {
        assert_eq!(format_fragment("Hel", "lo!"), "lo!");
    }

    #[test]
    fn accumulation_is_order_dependent_and_never_replayed() {
        let fragments = ["Here we go. ", "1. alpha ", "2. beta"];
        let mut accumulated = String::new();
        for fragment in fragments {
            let formatted = format_fragment(&accumulated, fragment);
            accumulated.push_str(&formatted);
        }

        assert_eq!(accumulated, "Here we go.\n1. alpha \n2. beta");
    }
}
