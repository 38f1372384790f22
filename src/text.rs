/// Return the first `max` characters of `s` (not bytes), borrowing from it.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate to `max` characters and append `...` if anything was cut.
pub fn ellipsize(s: &str, max: usize) -> String {
    let cut = truncate_chars(s, max);
    if cut.len() < s.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
