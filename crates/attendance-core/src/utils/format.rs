use chrono::{DateTime, Utc};

/// Pattern used when reporting when the dataset last changed
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d, %H:%M:%S";

/// Format a UTC timestamp as `YYYY-MM-DD, HH:MM:SS`
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Case-insensitive substring check (Unicode-aware lowercasing)
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Truncate a string to at most `max_len` bytes on a char boundary,
/// appending a marker with the original length if anything was cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &s[..end], s.len())
}

/// Normalize a multi-line text block the way docstrings are cleaned up:
/// trailing whitespace per line and leading/trailing blank lines are dropped,
/// and the indentation shared by all lines after the first is removed.
pub fn clean_doc(text: &str) -> String {
    let text = text.replace('\t', "        ");
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let indent = lines
        .iter()
        .skip(1)
        .filter(|l| !l.is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.trim_start()
            } else {
                l.get(indent..).unwrap_or_else(|| l.trim_start())
            }
        })
        .collect();

    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}
