const MAX_VISIBLE_CHARS: usize = 80;

/// Shortens free text for log fields. Transcripts run to thousands of
/// characters and logs only need the opening words.
pub fn text_preview(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return String::from("[empty]");
    }

    let total = trimmed.chars().count();
    if total <= MAX_VISIBLE_CHARS {
        return trimmed.to_string();
    }

    let cut = trimmed
        .char_indices()
        .nth(MAX_VISIBLE_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    format!("{}... ({} chars total)", &trimmed[..cut], total)
}
