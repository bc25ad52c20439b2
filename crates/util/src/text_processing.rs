//! # Text Processing Utilities
//!
//! Column fitting for the job table and credential redaction for anything
//! that ends up in the log file or the status line.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Rendered in place of missing optional values.
pub const PLACEHOLDER: &str = "-";

const ELLIPSIS: char = '…';

/// Returns the value or [`PLACEHOLDER`] when it is absent or blank.
pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => PLACEHOLDER,
    }
}

/// Truncates `text` to at most `max_width` terminal columns, ending with an
/// ellipsis when anything was cut.
///
/// # Example
/// ```rust
/// use queuedeck_util::text_processing::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("manual review", 20), "manual review");
/// assert_eq!(truncate_with_ellipsis("manual review", 7), "manual…");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > budget {
            break;
        }
        used += width;
        out.push(ch);
    }
    out.push(ELLIPSIS);
    out
}

/// Collapses newlines and runs of whitespace so multi-line server text fits
/// one table cell.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Redacts values that look like credentials in a string.
///
/// Covers `Authorization` headers, `X-API-Key` headers, bearer tokens and
/// `*_KEY=`/`*_TOKEN=` style assignments. Key names are kept for debugging.
///
/// # Example
/// ```rust
/// use queuedeck_util::text_processing::redact_sensitive;
///
/// assert_eq!(redact_sensitive("QUEUEDECK_API_KEY=abc123"), "QUEUEDECK_API_KEY=[REDACTED]");
/// assert_eq!(redact_sensitive("Authorization: Bearer secret123"), "Authorization: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}[REDACTED]")
            })
            .to_string();
    }
    redacted
}

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization:\s*)(?:bearer\s+|basic\s+)?[^\s,;]+",
        r"(?i)(x-api-key:\s*)[^\s,;]+",
        r"(?i)(bearer\s+)[A-Za-z0-9\-\._~\+/]+=*",
        r"(?i)([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)[^\s]+",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});
