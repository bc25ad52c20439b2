//! Render-driven prefetching of the next page.

use queuedeck_types::{Generation, PageRequest};

use super::pagination::PaginationController;

/// The trailing-edge condition a prefetch fired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrailingEdge {
    generation: Generation,
    loaded: usize,
    scroll_epoch: u64,
}

/// Requests the next page once rendering gets within `threshold` rows of
/// the loaded tail.
///
/// Fires at most once per (generation, loaded length, scroll epoch); a new
/// page or a new scroll event is needed before it fires again.
#[derive(Debug, Clone)]
pub struct PrefetchTrigger {
    threshold: usize,
    last_fired: Option<TrailingEdge>,
}

impl PrefetchTrigger {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            last_fired: None,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
    }

    /// Treats the given trailing edge as already fired.
    pub fn mark_handled(&mut self, generation: Generation, loaded: usize, scroll_epoch: u64) {
        self.last_fired = Some(TrailingEdge {
            generation,
            loaded,
            scroll_epoch,
        });
    }

    /// Called after each render with the highest rendered index (`None` when
    /// nothing was rendered).
    pub fn observe(
        &mut self,
        highest_rendered: Option<usize>,
        pagination: &mut PaginationController,
        scroll_epoch: u64,
    ) -> Option<PageRequest> {
        if !pagination.has_more() || pagination.is_in_flight() {
            return None;
        }
        let loaded = pagination.len();
        let near_tail = match highest_rendered {
            Some(index) => index + self.threshold >= loaded,
            None => loaded == 0,
        };
        if !near_tail {
            return None;
        }
        let edge = TrailingEdge {
            generation: pagination.generation(),
            loaded,
            scroll_epoch,
        };
        if self.last_fired == Some(edge) {
            return None;
        }
        let request = pagination.fetch_next_page()?;
        self.last_fired = Some(edge);
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuedeck_types::{FilterState, Page, QueueJob};

    fn loaded_controller(rows: i64, has_more: bool) -> PaginationController {
        let mut controller = PaginationController::new(FilterState::default(), 50);
        let request = controller.fetch_next_page().expect("request");
        let items: Vec<QueueJob> = (0..rows)
            .map(|id| serde_json::from_value(serde_json::json!({ "id": id })).expect("job"))
            .collect();
        controller.apply_page(
            request.generation,
            Page {
                items,
                offset: 0,
                limit: 50,
                has_more,
            },
        );
        controller
    }

    #[test]
    fn fires_only_within_threshold_of_tail() {
        let mut controller = loaded_controller(50, true);
        let mut trigger = PrefetchTrigger::new(5);
        assert!(trigger.observe(Some(20), &mut controller, 0).is_none());
        assert!(trigger.observe(Some(44), &mut controller, 1).is_none());
        let request = trigger.observe(Some(45), &mut controller, 2).expect("prefetch");
        assert_eq!(request.offset, 50);
    }

    #[test]
    fn does_not_fire_while_in_flight_or_exhausted() {
        let mut controller = loaded_controller(50, true);
        let mut trigger = PrefetchTrigger::new(10);
        assert!(trigger.observe(Some(49), &mut controller, 0).is_some());
        assert!(trigger.observe(Some(49), &mut controller, 1).is_none());

        let mut exhausted = loaded_controller(20, false);
        assert!(trigger.observe(Some(19), &mut exhausted, 2).is_none());
    }

    #[test]
    fn same_trailing_edge_fires_once_until_new_scroll() {
        let mut controller = loaded_controller(50, true);
        let mut trigger = PrefetchTrigger::new(10);
        let request = trigger.observe(Some(48), &mut controller, 7).expect("prefetch");
        controller.apply_failure(request.generation, "boom");

        // Re-render without scrolling: no retry storm.
        assert!(trigger.observe(Some(48), &mut controller, 7).is_none());
        // A new scroll event is an organic retry.
        assert!(trigger.observe(Some(48), &mut controller, 8).is_some());
    }

    #[test]
    fn empty_render_with_nothing_loaded_is_near_tail() {
        let mut controller = PaginationController::new(FilterState::default(), 50);
        let mut trigger = PrefetchTrigger::new(10);
        assert!(trigger.observe(None, &mut controller, 0).is_some());
    }
}
