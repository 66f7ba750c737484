//! Text Sanitizer
//!
//! Normalizes arbitrary page text into something safe to hand to TTS.

pub const DEFAULT_MAX_CHARS: usize = 3000;
const ELLIPSIS: &str = "...";

/// Collapses whitespace runs into single spaces, trims, and caps the result
/// at `max_chars` characters followed by an ellipsis.
pub fn sanitize_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(max_chars).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
