//! Queue job records and the paginated list contract.
//!
//! The wire shapes mirror the queue API's JSON (snake_case). Every optional
//! or nullable field deserializes to a default so a partially populated row
//! still renders; presentation code substitutes placeholders.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Processing status of a queue job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    /// Any status string this build does not know about, or a missing one.
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// The statuses an operator can filter by, in display order.
    pub const FILTERABLE: [JobStatus; 3] = [JobStatus::Pending, JobStatus::Processing, JobStatus::Completed];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseJobStatusError(pub String);

impl fmt::Display for ParseJobStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid job status '{}'; expected pending, processing or completed", self.0)
    }
}

impl std::error::Error for ParseJobStatusError {}

impl FromStr for JobStatus {
    type Err = ParseJobStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseJobStatusError(s.to_string())),
        }
    }
}

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One queue record as listed by `/api/queue/jobs`.
///
/// Immutable once fetched; a filter change discards the whole sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJob {
    pub id: i64,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub retry_count: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires_manual_review: bool,
    #[serde(default)]
    pub manual_review_reason: Option<String>,
    #[serde(default)]
    pub decision_reason: Option<String>,
    #[serde(default)]
    pub final_method: Option<String>,
    #[serde(default)]
    pub next_retry_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response body of the paginated list endpoint.
///
/// Servers report either `has_more` or a `total`; `limit`/`offset` echo the
/// request and are informational only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueJobListResponse {
    #[serde(default)]
    pub items: Vec<QueueJob>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub total: Option<usize>,
}

impl QueueJobListResponse {
    /// Normalizes the response into a [`Page`] fetched at `offset` with the
    /// requested `limit`.
    ///
    /// `has_more` resolution order: explicit flag, then `total`, then "a full
    /// page probably has a successor".
    pub fn into_page(self, offset: usize, limit: usize) -> Page {
        let received = self.items.len();
        let has_more = match (self.has_more, self.total) {
            (Some(flag), _) => flag,
            (None, Some(total)) => offset + received < total,
            (None, None) => received > 0 && received >= limit,
        };
        Page {
            items: self.items,
            offset,
            limit,
            has_more,
        }
    }
}

/// An ordered, contiguous slice of jobs plus the request that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<QueueJob>,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl Page {
    /// A page that returned fewer rows than requested while still claiming
    /// more exist.
    pub fn is_short_with_more(&self) -> bool {
        self.has_more && self.items.len() < self.limit
    }
}

/// Per-status counts shown in the dashboard header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(default)]
    pub pending: i64,
    #[serde(default)]
    pub processing: i64,
    #[serde(default)]
    pub completed: i64,
}

/// Aggregate queue health from `/api/queue/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueDashboard {
    #[serde(default)]
    pub status_counts: StatusCounts,
    #[serde(default)]
    pub manual_review_count: i64,
    #[serde(default)]
    pub error_count: i64,
    /// Jobs stuck in `processing` for longer than the server's stale window.
    #[serde(default)]
    pub stale_processing_count: i64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full record for a single job from `/api/queue/jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJobDetail {
    pub job: QueueJob,
    #[serde(default)]
    pub partial_fields: Option<Value>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub llm_latency_ms: Option<i64>,
    #[serde(default)]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_preview: Option<String>,
}
