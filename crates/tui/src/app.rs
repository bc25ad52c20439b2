//! Application state for the queuedeck TUI.
//!
//! `App` owns the list state, the dashboard header data and the detail view,
//! and applies asynchronous [`Msg`]s to them. Input handling lives in the
//! components; side effects are returned as [`Effect`]s and carried out by
//! the runtime through [`crate::cmd`].

use std::{rc::Rc, sync::Arc};

use queuedeck_api::QueueSource;
use queuedeck_types::{Effect, FilterState, Msg, QueueDashboard, QueueJobDetail};
use queuedeck_util::{DeckConfig, encode_filter};
use rat_focus::{Focus, FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tracing::{debug, warn};

use crate::ui::{components::QueueListState, theme::Theme};

/// Cross-cutting shared context owned by the App.
pub struct SharedCtx {
    pub config: DeckConfig,
    pub source: Arc<dyn QueueSource>,
    pub theme: Box<dyn Theme>,
}

impl SharedCtx {
    pub fn new(config: DeckConfig, source: Arc<dyn QueueSource>, theme: Box<dyn Theme>) -> Self {
        Self { config, source, theme }
    }
}

impl std::fmt::Debug for SharedCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCtx")
            .field("config", &self.config)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

/// Dashboard header data.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub data: Option<QueueDashboard>,
    pub error: Option<String>,
    pub loading: bool,
}

/// Detail modal for the activated job.
#[derive(Debug)]
pub struct DetailState {
    /// Job whose detail is shown or being fetched; `None` when closed.
    requested: Option<i64>,
    pub detail: Option<Box<QueueJobDetail>>,
    pub error: Option<String>,
    pub scroll: u16,
    pub f_detail: FocusFlag,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            requested: None,
            detail: None,
            error: None,
            scroll: 0,
            f_detail: FocusFlag::named("detail"),
        }
    }
}

impl DetailState {
    pub fn is_open(&self) -> bool {
        self.requested.is_some()
    }

    pub fn requested(&self) -> Option<i64> {
        self.requested
    }

    pub fn is_loading(&self) -> bool {
        self.requested.is_some() && self.detail.is_none() && self.error.is_none()
    }

    pub fn open(&mut self, id: i64) {
        self.requested = Some(id);
        self.detail = None;
        self.error = None;
        self.scroll = 0;
    }

    pub fn close(&mut self) {
        self.requested = None;
        self.detail = None;
        self.error = None;
        self.scroll = 0;
    }

    pub fn scroll_by(&mut self, delta: i16) {
        self.scroll = self.scroll.saturating_add_signed(delta);
    }

    fn apply_loaded(&mut self, detail: Box<QueueJobDetail>) {
        if self.requested == Some(detail.job.id) {
            self.detail = Some(detail);
        } else {
            debug!(id = detail.job.id, "discarding detail for a job that is no longer open");
        }
    }

    fn apply_failed(&mut self, id: i64, error: &str) {
        if self.requested == Some(id) {
            self.error = Some(error.to_string());
        }
    }
}

pub struct App {
    /// Shared, cross-cutting context (config, data source, theme)
    pub ctx: SharedCtx,
    /// The virtualized job list
    pub queue: QueueListState,
    pub dashboard: DashboardState,
    pub detail: DetailState,
    /// Query string for the committed filter; printed on exit
    pub share_query: String,
    /// Focus tree, rebuilt before every render
    pub focus: Rc<Focus>,
    /// Animation frame for the loading throbber
    pub throbber_idx: usize,
}

impl App {
    pub fn new(ctx: SharedCtx, initial: FilterState) -> Self {
        let queue = QueueListState::new(&ctx.config, initial);
        let mut app = Self {
            ctx,
            queue,
            dashboard: DashboardState::default(),
            detail: DetailState::default(),
            share_query: encode_filter(&initial),
            focus: Rc::new(Focus::default()),
            throbber_idx: 0,
        };
        app.focus = Rc::new(FocusBuilder::build_for(&app));
        app.focus.focus(&app.queue.f_list);
        app
    }

    /// Effects that start the session: first page and dashboard counts.
    pub fn mount(&mut self) -> Vec<Effect> {
        let mut effects = self.queue.mount();
        effects.push(Effect::FetchDashboard);
        effects
    }

    /// Whether anything is loading; drives the fast tick.
    pub fn is_busy(&self) -> bool {
        self.queue.pagination.is_in_flight() || self.dashboard.loading || self.detail.is_loading()
    }

    pub fn update(&mut self, msg: &Msg) -> Vec<Effect> {
        match msg {
            Msg::Tick => {
                if self.is_busy() {
                    self.throbber_idx = (self.throbber_idx + 1) % 10;
                }
                Vec::new()
            }
            // Layout is recomputed on the next render.
            Msg::Resize(..) => Vec::new(),
            Msg::PageLoaded { generation, page } => {
                self.queue.page_loaded(*generation, page.clone());
                Vec::new()
            }
            Msg::PageFailed { generation, error } => {
                self.queue.page_failed(*generation, error);
                Vec::new()
            }
            Msg::FilterDebounceElapsed => self.queue.commit_pending(),
            Msg::DashboardLoaded(dashboard) => {
                self.dashboard.data = Some(dashboard.clone());
                self.dashboard.error = None;
                self.dashboard.loading = false;
                Vec::new()
            }
            Msg::DashboardFailed(error) => {
                warn!(%error, "dashboard request failed");
                self.dashboard.error = Some(error.clone());
                self.dashboard.loading = false;
                Vec::new()
            }
            Msg::DetailLoaded(detail) => {
                self.detail.apply_loaded(detail.clone());
                Vec::new()
            }
            Msg::DetailFailed { id, error } => {
                self.detail.apply_failed(*id, error);
                Vec::new()
            }
        }
    }
}

impl HasFocus for App {
    fn build(&self, builder: &mut FocusBuilder) {
        if self.detail.is_open() {
            builder.leaf_widget(&self.detail.f_detail);
        } else {
            self.queue.build(builder);
        }
    }

    fn focus(&self) -> FocusFlag {
        if self.detail.is_open() {
            self.detail.f_detail.clone()
        } else {
            self.queue.focus()
        }
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use queuedeck_api::ApiError;
    use queuedeck_types::{Page, QueueJob};

    use crate::ui::theme::NordTheme;

    /// In-memory queue with `total` jobs.
    #[derive(Debug, Default)]
    pub(crate) struct FixedSource {
        pub total: usize,
    }

    #[async_trait]
    impl QueueSource for FixedSource {
        async fn list_jobs(&self, _filter: &FilterState, offset: usize, limit: usize) -> Result<Page, ApiError> {
            let end = (offset + limit).min(self.total);
            let items = (offset..end)
                .map(|id| serde_json::from_value::<QueueJob>(serde_json::json!({ "id": id })))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Page {
                items,
                offset,
                limit,
                has_more: end < self.total,
            })
        }

        async fn dashboard(&self) -> Result<QueueDashboard, ApiError> {
            Ok(QueueDashboard::default())
        }

        async fn job_detail(&self, id: i64) -> Result<QueueJobDetail, ApiError> {
            Ok(serde_json::from_value(serde_json::json!({ "job": { "id": id } }))?)
        }
    }

    pub(crate) fn test_app(source: Arc<dyn QueueSource>) -> App {
        let ctx = SharedCtx::new(DeckConfig::default(), source, Box::new(NordTheme::new()));
        App::new(ctx, FilterState::default())
    }

    fn detail(id: i64) -> Box<QueueJobDetail> {
        Box::new(serde_json::from_value(serde_json::json!({ "job": { "id": id } })).expect("detail"))
    }

    #[test]
    fn mount_requests_first_page_and_dashboard() {
        let mut app = test_app(Arc::new(FixedSource::default()));
        let effects = app.mount();
        assert!(matches!(effects.first(), Some(Effect::FetchPage(request)) if request.offset == 0));
        assert_eq!(effects.last(), Some(&Effect::FetchDashboard));
        assert!(app.is_busy());
    }

    #[test]
    fn detail_for_a_closed_job_is_ignored() {
        let mut app = test_app(Arc::new(FixedSource::default()));
        app.detail.open(4);
        app.update(&Msg::DetailLoaded(detail(3)));
        assert!(app.detail.detail.is_none());
        assert!(app.detail.is_loading());

        app.update(&Msg::DetailLoaded(detail(4)));
        assert_eq!(app.detail.detail.as_ref().map(|d| d.job.id), Some(4));

        app.detail.close();
        app.update(&Msg::DetailFailed {
            id: 4,
            error: "gone".into(),
        });
        assert!(app.detail.error.is_none());
    }

    #[test]
    fn debounce_message_commits_pending_filter() {
        let mut app = test_app(Arc::new(FixedSource::default()));
        app.mount();
        app.queue.toggle_review_only();
        let effects = app.update(&Msg::FilterDebounceElapsed);
        assert_eq!(effects[0], Effect::SyncQueryString("review=true".into()));
        assert!(app.update(&Msg::FilterDebounceElapsed).is_empty());
    }

    #[test]
    fn dashboard_failure_keeps_previous_counts() {
        let mut app = test_app(Arc::new(FixedSource::default()));
        app.update(&Msg::DashboardLoaded(QueueDashboard {
            error_count: 2,
            ..QueueDashboard::default()
        }));
        app.update(&Msg::DashboardFailed("503".into()));
        assert_eq!(app.dashboard.data.as_ref().map(|d| d.error_count), Some(2));
        assert_eq!(app.dashboard.error.as_deref(), Some("503"));
    }
}
