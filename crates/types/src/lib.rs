//! Shared types for the queuedeck crates: queue records, filters, and the
//! message/effect vocabulary exchanged between the list state and the
//! runtime.

use std::time::Duration;

pub mod filter;
pub mod queue;

pub use filter::{FilterState, Generation, PageRequest, StatusFilter};
pub use queue::{
    JobStatus, Page, ParseJobStatusError, QueueDashboard, QueueJob, QueueJobDetail, QueueJobListResponse, StatusCounts,
};

/// Messages that can be sent to update the application state.
///
/// Input events are routed separately; these are the asynchronous and timed
/// events the runtime feeds back into the state.
#[derive(Debug, Clone)]
pub enum Msg {
    /// Periodic UI tick (e.g., throbbers)
    Tick,
    /// Terminal resized
    Resize(u16, u16),
    /// A page fetch resolved successfully
    PageLoaded { generation: Generation, page: Page },
    /// A page fetch failed at the transport, status or decode level
    PageFailed { generation: Generation, error: String },
    /// The filter debounce deadline elapsed
    FilterDebounceElapsed,
    /// Dashboard counts arrived
    DashboardLoaded(QueueDashboard),
    /// Dashboard request failed
    DashboardFailed(String),
    /// Detail for an activated job arrived
    DetailLoaded(Box<QueueJobDetail>),
    /// Detail request failed
    DetailFailed { id: i64, error: String },
}

/// Side effects that can be triggered by state changes.
///
/// State transitions stay synchronous; the runtime turns these into spawned
/// requests, timer changes and host callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch one page of jobs
    FetchPage(PageRequest),
    /// (Re)arm the single filter debounce timer
    ScheduleFilterCommit(Duration),
    /// Disarm the filter debounce timer
    CancelFilterCommit,
    /// Mirror the committed filter into the shareable query string
    SyncQueryString(String),
    /// The operator activated a job; the host opens its detail view
    ActivateJob(i64),
    /// Refresh the dashboard counts
    FetchDashboard,
    /// Close the detail view
    CloseDetail,
    /// Leave the application
    Quit,
}
