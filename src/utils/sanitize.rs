//! Text clean-up for scraped fields and outgoing alert messages.

/// Collapses every run of whitespace (including newlines) into one space and
/// trims both ends.
///
/// Availability blocks in product pages are indented across many lines; the
/// stored value must be a single readable line.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes control characters, keeping tab, newline and carriage return.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Truncates to at most `max_chars` characters, appending `...` when cut.
///
/// Works on characters, not bytes, so multi-byte titles are never split.
///
/// # Arguments
///
/// * `text` - The text to shorten
/// * `max_chars` - Maximum number of characters kept before the ellipsis
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
