//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Timestamps are stored as RFC3339 text; a row with a corrupted value still
/// loads instead of failing the whole query.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Build a `LIKE` pattern that matches `needle` anywhere in a column
///
/// `%`, `_` and `\` in the needle are escaped, so queries using the pattern
/// must declare `ESCAPE '\'`.
///
/// # Examples
///
/// ```
/// use rentcamp_db::utils::contains_pattern;
///
/// assert_eq!(contains_pattern("tent"), "%tent%");
/// assert_eq!(contains_pattern("50%"), "%50\\%%");
/// ```
pub fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
