//! Small display helpers

/// Shorten a string for log output, ending in "..." when it was cut.
/// Multi-byte text is cut at the nearest char boundary under the limit.
pub fn truncate_for_display(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let limit = max_len.saturating_sub(3);
    let cut = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= limit)
        .last()
        .unwrap_or(0);
    format!("{}...", &s[..cut])
}
