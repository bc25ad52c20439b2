//! Shareable query-string form of the committed filter.
//!
//! Keys: `status` (omitted for "all") and `review=true` (omitted when off).
//! An empty string means the unfiltered view.

use queuedeck_types::{FilterState, StatusFilter};
use thiserror::Error;
use url::form_urlencoded;

pub const STATUS_KEY: &str = "status";
pub const REVIEW_KEY: &str = "review";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryStringError {
    #[error("unknown status '{0}' in query string")]
    UnknownStatus(String),
    #[error("invalid value '{0}' for review; expected true or false")]
    InvalidReview(String),
}

/// Encodes the filter; the unfiltered view encodes to `""`.
pub fn encode_filter(filter: &FilterState) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(status) = filter.status.status() {
        serializer.append_pair(STATUS_KEY, status.as_str());
    }
    if filter.requires_manual_review {
        serializer.append_pair(REVIEW_KEY, "true");
    }
    serializer.finish()
}

/// Decodes a query string (with or without a leading `?`).
///
/// Unrelated keys are ignored. Malformed known keys are errors so a typo in a
/// shared link is not silently widened to "all".
pub fn decode_filter(query: &str) -> Result<FilterState, QueryStringError> {
    let query = query.trim().trim_start_matches('?');
    let mut filter = FilterState::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            STATUS_KEY => {
                filter.status = value
                    .parse::<StatusFilter>()
                    .map_err(|_| QueryStringError::UnknownStatus(value.to_string()))?;
            }
            REVIEW_KEY => {
                filter.requires_manual_review = match value.to_ascii_lowercase().as_str() {
                    "true" | "1" => true,
                    "false" | "0" | "" => false,
                    _ => return Err(QueryStringError::InvalidReview(value.to_string())),
                };
            }
            _ => {}
        }
    }
    Ok(filter)
}
