//! # Queuedeck TUI Library
//!
//! Terminal view of a job queue: a virtualized, incrementally paginated,
//! keyboard-navigable list with debounced filters, a dashboard header and a
//! detail modal.
//!
//! ## Architecture
//!
//! State transitions are synchronous and return `Effect`s; the runtime loop
//! applies local effects, spawns network requests and feeds their results
//! back as `Msg`s. The list itself is composed of five parts:
//!
//! - [`PaginationController`]: loaded rows, cursor and request generations
//! - [`ViewportVirtualizer`]: which rows are on screen, with measured heights
//! - [`PrefetchTrigger`]: requests the next page as the viewport nears the end
//! - [`NavigationState`]: active row and keyboard movement
//! - the filter synchronizer: debounced filter commits and query strings

mod app;
mod cmd;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use queuedeck_api::QueueSource;
use queuedeck_types::FilterState;
use queuedeck_util::DeckConfig;

pub use ui::components::queue::{
    NavKey, NavOutcome, NavigationState, PageOutcome, PaginationController, PrefetchTrigger, QueueListState,
    ViewportVirtualizer, ViewportWindow,
};
pub use ui::theme::THEME_ENV;

/// Runs the TUI until the operator quits.
///
/// `initial` is the filter the list opens with (typically decoded from a
/// `--query` argument or taken from the configured default). Returns the
/// query string of the last committed filter so the caller can print it.
///
/// # Errors
///
/// Fails when the terminal cannot be put into raw mode or drawn to.
pub async fn run(config: DeckConfig, source: Arc<dyn QueueSource>, initial: FilterState) -> Result<String> {
    let theme = ui::theme::load_from_env();
    let app = app::App::new(app::SharedCtx::new(config, source, theme), initial);
    ui::runtime::run_app(app).await
}
