//! The virtualized, paginated job list.
//!
//! The five state machines are kept free of terminal concerns; `state`
//! composes them and `queue_component` wires them to crossterm input and
//! ratatui rendering.

pub mod filter_sync;
pub mod navigation;
pub mod pagination;
pub mod prefetch;
mod queue_component;
pub mod row_cache;
pub mod state;
pub mod virtualizer;

pub use navigation::{NavKey, NavOutcome, NavigationState};
pub use pagination::{PageOutcome, PaginationController};
pub use prefetch::PrefetchTrigger;
pub use queue_component::QueueComponent;
pub use row_cache::{RowCache, RowCells};
pub use state::QueueListState;
pub use virtualizer::{RowHeightRegistry, ViewportVirtualizer, ViewportWindow};
