//! # Date Handling Utilities
//!
//! Formatting for the timestamps shown in the job table, the detail modal and
//! the dashboard header.

use chrono::{DateTime, Utc};

use crate::text_processing::PLACEHOLDER;

/// Table/detail timestamp layout.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formats an optional UTC timestamp, using the placeholder when absent.
///
/// # Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use queuedeck_util::date_handling::format_timestamp;
///
/// let at = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).single();
/// assert_eq!(format_timestamp(at), "2025-03-09 14:05");
/// assert_eq!(format_timestamp(None), "-");
/// ```
pub fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(at) => at.format(TIMESTAMP_FORMAT).to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Coarse "how long ago" text relative to `now`, e.g. `42s ago`, `5m ago`.
///
/// Future instants (scheduled retries) are rendered as `in 3m`.
pub fn format_relative(value: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = value else {
        return PLACEHOLDER.to_string();
    };
    let seconds = now.signed_duration_since(at).num_seconds();
    let magnitude = seconds.unsigned_abs();
    let amount = match magnitude {
        0..=59 => format!("{magnitude}s"),
        60..=3_599 => format!("{}m", magnitude / 60),
        3_600..=86_399 => format!("{}h", magnitude / 3_600),
        _ => format!("{}d", magnitude / 86_400),
    };
    if seconds < 0 { format!("in {amount}") } else { format!("{amount} ago") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn relative_formatting_picks_largest_unit() {
        let now = noon();
        assert_eq!(format_relative(Some(now - Duration::seconds(42)), now), "42s ago");
        assert_eq!(format_relative(Some(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(format_relative(Some(now - Duration::hours(3)), now), "3h ago");
        assert_eq!(format_relative(Some(now - Duration::days(2)), now), "2d ago");
    }

    #[test]
    fn future_instants_read_as_upcoming() {
        let now = noon();
        assert_eq!(format_relative(Some(now + Duration::minutes(3)), now), "in 3m");
        assert_eq!(format_relative(None, now), PLACEHOLDER);
    }
}
