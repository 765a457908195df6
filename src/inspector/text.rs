/// Maximum length of extracted body text
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Normalizes whitespace within a single line or paragraph
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans extracted text for the models
///
/// Runs of whitespace (newlines included) collapse to a single space, the ends
/// are trimmed and the result is cut to [`MAX_CONTENT_CHARS`] characters.
pub fn clean_text(text: &str) -> String {
    let normalized = normalize_whitespace_in_segment(text);
    truncate_chars(&normalized, MAX_CONTENT_CHARS).to_string()
}

/// First `max` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// First `max` characters of `text`, with `...` appended when something was cut
pub fn excerpt(text: &str, max: usize) -> String {
    let head = truncate_chars(text, max);
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}
