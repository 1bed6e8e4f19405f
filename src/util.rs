// src/util.rs — Small string helpers

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_str(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Truncate for display, appending "..." when something was cut.
pub fn preview(s: &str, max: usize) -> String {
    let cut = truncate_str(s, max);
    if cut.len() < s.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}
