//! Composed state of the queue list view.
//!
//! Wires the pagination controller, virtualizer, prefetch trigger, navigation
//! pointer and filter synchronizer together. Every entry point is synchronous
//! and returns the [`Effect`]s the runtime should carry out.

use queuedeck_types::{Effect, FilterState, Generation, Page, QueueJob, StatusFilter};
use queuedeck_util::{DeckConfig, encode_filter};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tracing::info;

use super::{
    filter_sync::FilterSynchronizer,
    navigation::{NavKey, NavOutcome, NavigationState},
    pagination::{PageOutcome, PaginationController},
    prefetch::PrefetchTrigger,
    row_cache::RowCache,
    virtualizer::ViewportVirtualizer,
};

#[derive(Debug)]
pub struct QueueListState {
    pub pagination: PaginationController,
    pub virtualizer: ViewportVirtualizer,
    pub prefetch: PrefetchTrigger,
    pub navigation: NavigationState,
    pub filters: FilterSynchronizer,
    pub rows: RowCache,
    /// Bumped on every scroll event; part of the prefetch trigger key.
    scroll_epoch: u64,
    /// Container focus
    container: FocusFlag,
    pub f_filters: FocusFlag,
    pub f_list: FocusFlag,
    /// Last rendered list area for mouse hit-testing.
    pub list_area: Rect,
}

impl QueueListState {
    pub fn new(config: &DeckConfig, initial: FilterState) -> Self {
        Self {
            pagination: PaginationController::new(initial, config.page_size),
            virtualizer: ViewportVirtualizer::new(config.estimated_row_height, config.overscan),
            prefetch: PrefetchTrigger::new(config.prefetch_threshold),
            navigation: NavigationState::default(),
            filters: FilterSynchronizer::new(initial, config.debounce()),
            rows: RowCache::default(),
            scroll_epoch: 0,
            container: FocusFlag::named("queue"),
            f_filters: FocusFlag::named("queue.filters"),
            f_list: FocusFlag::named("queue.list"),
            list_area: Rect::default(),
        }
    }

    /// Starts the first listing for the committed filter.
    pub fn mount(&mut self) -> Vec<Effect> {
        self.reset_to(self.filters.committed());
        self.fetch_next().into_iter().collect()
    }

    pub fn items(&self) -> &[QueueJob] {
        self.pagination.items()
    }

    pub fn active_job(&self) -> Option<&QueueJob> {
        self.navigation.active().and_then(|index| self.pagination.item(index))
    }

    pub fn scroll_epoch(&self) -> u64 {
        self.scroll_epoch
    }

    // ---- filters -------------------------------------------------------

    pub fn cycle_status(&mut self, forward: bool) -> Vec<Effect> {
        let delay = self.filters.edit(|filter| {
            filter.status = if forward { filter.status.next() } else { filter.status.prev() };
        });
        vec![Effect::ScheduleFilterCommit(delay)]
    }

    pub fn set_status(&mut self, status: StatusFilter) -> Vec<Effect> {
        let delay = self.filters.edit(|filter| filter.status = status);
        vec![Effect::ScheduleFilterCommit(delay)]
    }

    pub fn toggle_review_only(&mut self) -> Vec<Effect> {
        let delay = self
            .filters
            .edit(|filter| filter.requires_manual_review = !filter.requires_manual_review);
        vec![Effect::ScheduleFilterCommit(delay)]
    }

    /// Debounce deadline elapsed.
    pub fn commit_pending(&mut self) -> Vec<Effect> {
        let Some(committed) = self.filters.commit() else {
            return Vec::new();
        };
        info!(filter = ?committed, "filter committed");
        self.reset_to(committed);
        let mut effects = vec![Effect::SyncQueryString(encode_filter(&committed))];
        effects.extend(self.fetch_next());
        effects
    }

    /// Explicit apply: skips the remaining quiet period.
    pub fn apply_now(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::CancelFilterCommit];
        effects.extend(self.commit_pending());
        effects
    }

    pub fn clear_filters(&mut self) -> Vec<Effect> {
        self.filters.set_pending(FilterState::default());
        self.apply_now()
    }

    /// Reloads the committed filter from the first page.
    pub fn refresh(&mut self) -> Vec<Effect> {
        self.reset_to(self.filters.committed());
        let mut effects: Vec<Effect> = self.fetch_next().into_iter().collect();
        effects.push(Effect::FetchDashboard);
        effects
    }

    /// Explicit retry after a failed fetch.
    pub fn retry(&mut self) -> Vec<Effect> {
        if self.pagination.error().is_none() {
            return Vec::new();
        }
        self.fetch_next().into_iter().collect()
    }

    // ---- fetch results -------------------------------------------------

    pub fn page_loaded(&mut self, generation: Generation, page: Page) {
        if let PageOutcome::Appended { .. } = self.pagination.apply_page(generation, page) {
            let len = self.pagination.len();
            self.virtualizer.set_item_count(len);
            self.navigation.on_len_changed(len);
        }
    }

    /// A failure counts as handling the current trailing edge; the next
    /// attempt needs a new scroll or an explicit retry.
    pub fn page_failed(&mut self, generation: Generation, error: &str) {
        if self.pagination.apply_failure(generation, error) {
            self.prefetch
                .mark_handled(generation, self.pagination.len(), self.scroll_epoch);
        }
    }

    // ---- viewport ------------------------------------------------------

    pub fn set_viewport_height(&mut self, height: u16) {
        self.virtualizer.set_viewport_height(height);
    }

    /// Wheel or paging scroll that does not move the active row.
    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll_epoch += 1;
        self.virtualizer.scroll_by(delta);
    }

    pub fn record_row_height(&mut self, index: usize, height: u16) {
        self.virtualizer.record_height(index, height);
    }

    /// Runs the prefetch policy against the range that was just rendered.
    pub fn after_render(&mut self) -> Vec<Effect> {
        let range = self.virtualizer.render_range();
        let highest = range.end.checked_sub(1).filter(|_| !range.is_empty());
        self.prefetch
            .observe(highest, &mut self.pagination, self.scroll_epoch)
            .map(Effect::FetchPage)
            .into_iter()
            .collect()
    }

    // ---- navigation ----------------------------------------------------

    /// Applies a navigation key. Returns the outcome so the caller can move
    /// input focus to the list.
    pub fn navigate(&mut self, key: NavKey) -> (NavOutcome, Vec<Effect>) {
        let outcome = self.navigation.handle(key, self.pagination.len());
        let effects = self.after_navigation(outcome);
        (outcome, effects)
    }

    /// Page step for PageUp/PageDown.
    pub fn page_step(&self) -> usize {
        self.virtualizer.fully_visible_rows()
    }

    /// Mouse click on the row at `index`.
    pub fn select_index(&mut self, index: usize) -> NavOutcome {
        let outcome = self.navigation.select(index, self.pagination.len());
        self.after_navigation(outcome);
        outcome
    }

    /// Row index under a terminal row inside the list area.
    ///
    /// The list is drawn from the top edge of the first visible row, so hit
    /// testing starts there rather than at the raw scroll offset.
    pub fn index_at_row(&self, row: u16) -> Option<usize> {
        let area = self.list_area;
        if row < area.y || row >= area.y + area.height {
            return None;
        }
        let window = self.virtualizer.window()?;
        let registry = self.virtualizer.registry();
        let offset = registry.offset_of(window.first_visible) + u32::from(row - area.y);
        if offset >= registry.total() {
            return None;
        }
        registry.index_at(offset)
    }

    fn after_navigation(&mut self, outcome: NavOutcome) -> Vec<Effect> {
        match outcome {
            NavOutcome::Moved(index) => {
                if self.virtualizer.ensure_visible(index) {
                    self.scroll_epoch += 1;
                }
                Vec::new()
            }
            NavOutcome::Activate(index) => self
                .pagination
                .item(index)
                .map(|job| vec![Effect::ActivateJob(job.id)])
                .unwrap_or_default(),
            NavOutcome::Unchanged => Vec::new(),
        }
    }

    // ---- internals -----------------------------------------------------

    fn reset_to(&mut self, filter: FilterState) {
        self.pagination.reset(filter);
        self.virtualizer.reset();
        self.virtualizer.scroll_to_index(0);
        self.navigation.reset();
        self.prefetch.reset();
        self.rows.clear();
        self.scroll_epoch += 1;
    }

    fn fetch_next(&mut self) -> Option<Effect> {
        self.pagination.fetch_next_page().map(Effect::FetchPage)
    }
}

impl HasFocus for QueueListState {
    fn build(&self, builder: &mut FocusBuilder) {
        let start = builder.start(self);
        builder.leaf_widget(&self.f_filters);
        builder.leaf_widget(&self.f_list);
        builder.end(start);
    }

    fn focus(&self) -> FocusFlag {
        self.container.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}
