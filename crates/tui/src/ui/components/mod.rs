//! UI components: dashboard header, job list, detail modal.

pub mod common;
pub mod component;
pub mod dashboard;
pub mod detail;
pub mod queue;

pub use component::*;
pub use dashboard::DashboardComponent;
pub use detail::DetailComponent;
pub use queue::{QueueComponent, QueueListState};
