//! Formatted table rows keyed by job id.
//!
//! Rows are immutable once fetched, so formatted cells stay valid until the
//! next reset. Text relative to the current time is the exception and is
//! formatted at draw time. Only rows inside the current render range are
//! retained; rows scrolled out are recycled rather than kept for the whole
//! sequence.

use std::collections::HashMap;
use std::ops::Range;

use chrono::{DateTime, Utc};
use queuedeck_types::QueueJob;
use queuedeck_util::{format_relative, format_timestamp, or_placeholder, single_line};

/// Pre-formatted cell text for one job row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCells {
    pub id: String,
    pub status: String,
    pub priority: String,
    pub retries: String,
    pub review: String,
    pub message_id: String,
    pub updated: String,
    next_retry_at: Option<DateTime<Utc>>,
    /// Second line shown under rows flagged for manual review.
    pub review_reason: Option<String>,
}

impl RowCells {
    pub fn from_job(job: &QueueJob) -> Self {
        let review_reason = job
            .requires_manual_review
            .then(|| {
                job.manual_review_reason
                    .as_deref()
                    .or(job.decision_reason.as_deref())
                    .map(single_line)
            })
            .flatten()
            .filter(|reason| !reason.is_empty());
        Self {
            id: job.id.to_string(),
            status: job.status.to_string(),
            priority: job.priority.to_string(),
            retries: job.retry_count.to_string(),
            review: if job.requires_manual_review { "●".into() } else { String::new() },
            message_id: or_placeholder(job.message_id.as_deref()).to_string(),
            updated: format_timestamp(job.updated_at),
            next_retry_at: job.next_retry_at,
            review_reason,
        }
    }

    /// Time until the next retry, relative to `now`.
    pub fn next_retry(&self, now: DateTime<Utc>) -> String {
        format_relative(self.next_retry_at, now)
    }

    /// Terminal rows this entry occupies.
    pub fn height(&self) -> u16 {
        if self.review_reason.is_some() { 2 } else { 1 }
    }
}

#[derive(Debug, Default)]
pub struct RowCache {
    rows: HashMap<i64, RowCells>,
}

impl RowCache {
    /// Returns cached cells for `job`, formatting them on first use.
    pub fn get_or_format(&mut self, job: &QueueJob) -> &RowCells {
        self.rows.entry(job.id).or_insert_with(|| RowCells::from_job(job))
    }

    /// Drops rows whose index fell outside `range`.
    pub fn retain_range(&mut self, items: &[QueueJob], range: Range<usize>) {
        let start = range.start.min(items.len());
        let end = range.end.min(items.len());
        let keep: Vec<i64> = items[start..end].iter().map(|job| job.id).collect();
        self.rows.retain(|id, _| keep.contains(id));
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("timestamp")
    }

    fn job(value: serde_json::Value) -> QueueJob {
        serde_json::from_value(value).expect("job")
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let cells = RowCells::from_job(&job(serde_json::json!({ "id": 9 })));
        assert_eq!(cells.message_id, "-");
        assert_eq!(cells.updated, "-");
        assert_eq!(cells.next_retry(now()), "-");
        assert_eq!(cells.status, "unknown");
        assert_eq!(cells.height(), 1);
    }

    #[test]
    fn review_rows_take_two_lines() {
        let cells = RowCells::from_job(
            &job(serde_json::json!({
                "id": 1,
                "requires_manual_review": true,
                "manual_review_reason": "low confidence\non amount"
            })),
        );
        assert_eq!(cells.review_reason.as_deref(), Some("low confidence on amount"));
        assert_eq!(cells.height(), 2);

        let flagged_without_reason =
            RowCells::from_job(&job(serde_json::json!({ "id": 2, "requires_manual_review": true })));
        assert_eq!(flagged_without_reason.height(), 1);
        assert_eq!(flagged_without_reason.review, "●");
    }

    #[test]
    fn rows_outside_range_are_recycled() {
        let items: Vec<QueueJob> = (0..10).map(|id| job(serde_json::json!({ "id": id }))).collect();
        let mut cache = RowCache::default();
        for item in &items[0..5] {
            cache.get_or_format(item);
        }
        cache.get_or_format(&items[2]);
        assert_eq!(cache.len(), 5);

        cache.retain_range(&items, 3..8);
        assert_eq!(cache.len(), 2);
        cache.retain_range(&items, 20..30);
        assert!(cache.is_empty());
    }

    #[test]
    fn cached_retry_time_follows_the_clock() {
        let mut cache = RowCache::default();
        let item = job(serde_json::json!({ "id": 4, "next_retry_at": "2025-06-01T12:10:00Z" }));
        assert_eq!(cache.get_or_format(&item).next_retry(now()), "in 10m");
        let later = now() + chrono::Duration::minutes(7);
        assert_eq!(cache.get_or_format(&item).next_retry(later), "in 3m");
    }
}
