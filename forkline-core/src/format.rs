//! Formatting helpers shared by the CLI and logs.

use chrono::{DateTime, Utc};

/// Format a millisecond timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Values outside chrono's range fall back to the raw number.
pub fn format_timestamp(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Single-line preview of message content, cut at `max_chars` characters.
pub fn preview(content: Option<&str>, max_chars: usize) -> String {
    let Some(content) = content else {
        return String::new();
    };
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}
