//! Free-text input sanitization
//!
//! Applied to the primary stage call only; fallbacks always receive the
//! original input.

/// Default cap on sanitized input length, in chars
pub const DEFAULT_INPUT_CAP: usize = 10_000;

/// Marker appended when input is truncated
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Sanitize free text before it reaches a semantic stage
///
/// Collapses whitespace runs to single spaces, strips null bytes, and
/// truncates to `cap` chars with [`TRUNCATION_MARKER`] appended. The cap
/// counts Unicode scalar values, so truncation never splits a code point.
#[must_use]
pub fn sanitize_text(text: &str, cap: usize) -> String {
    let stripped = text.replace('\0', "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let len = collapsed.chars().count();
    if len <= cap {
        return collapsed;
    }

    tracing::warn!("input text truncated from {} to {} chars", len, cap);
    let mut truncated: String = collapsed.chars().take(cap).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        let text = "Alice   will\timplement\n\nauth  by Friday";
        assert_eq!(
            sanitize_text(text, DEFAULT_INPUT_CAP),
            "Alice will implement auth by Friday"
        );
    }

    #[test]
    fn strips_null_bytes() {
        assert_eq!(sanitize_text("dead\0line", DEFAULT_INPUT_CAP), "deadline");
    }

    #[test]
    fn truncates_over_cap_with_marker() {
        let text = "word ".repeat(100);
        let sanitized = sanitize_text(&text, 20);
        assert!(sanitized.ends_with(TRUNCATION_MARKER));
        assert_eq!(sanitized.chars().count(), 20 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn short_input_passes_through_untruncated() {
        let sanitized = sanitize_text("short note", DEFAULT_INPUT_CAP);
        assert_eq!(sanitized, "short note");
        assert!(!sanitized.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn cap_counts_chars_not_bytes() {
        let text = "é".repeat(30);
        let sanitized = sanitize_text(&text, 10);
        assert!(sanitized.starts_with(&"é".repeat(10)));
        assert!(sanitized.ends_with(TRUNCATION_MARKER));
    }
}
