//! Offset pagination over the remote job listing.
//!
//! The controller owns the item sequence for the committed filter and hands
//! out at most one [`PageRequest`] at a time. Results are matched against the
//! [`Generation`] captured when the request was issued; anything that
//! resolves after a reset is dropped.

use queuedeck_types::{FilterState, Generation, Page, PageRequest, QueueJob};
use tracing::{debug, warn};

/// What happened to a resolved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Rows were appended (possibly zero).
    Appended { received: usize },
    /// The page belonged to an earlier generation and was discarded.
    Stale,
}

#[derive(Debug)]
pub struct PaginationController {
    filter: FilterState,
    generation: Generation,
    items: Vec<QueueJob>,
    next_offset: usize,
    page_size: usize,
    has_more: bool,
    in_flight: bool,
    error: Option<String>,
    pages_loaded: usize,
}

impl PaginationController {
    pub fn new(filter: FilterState, page_size: usize) -> Self {
        Self {
            filter,
            generation: Generation::default(),
            items: Vec::new(),
            next_offset: 0,
            page_size: page_size.max(1),
            has_more: true,
            in_flight: false,
            error: None,
            pages_loaded: 0,
        }
    }

    /// Discards everything loaded for the previous filter and starts a new
    /// generation. Does not fetch.
    pub fn reset(&mut self, filter: FilterState) {
        self.generation = self.generation.next();
        self.filter = filter;
        self.items.clear();
        self.next_offset = 0;
        self.has_more = true;
        self.in_flight = false;
        self.error = None;
        self.pages_loaded = 0;
        debug!(generation = %self.generation, ?filter, "pagination reset");
    }

    /// Issues the next page request, or `None` while one is in flight or the
    /// listing is exhausted.
    pub fn fetch_next_page(&mut self) -> Option<PageRequest> {
        if self.in_flight || !self.has_more {
            return None;
        }
        self.in_flight = true;
        let request = PageRequest {
            generation: self.generation,
            filter: self.filter,
            offset: self.next_offset,
            limit: self.page_size,
        };
        debug!(generation = %request.generation, offset = request.offset, limit = request.limit, "page requested");
        Some(request)
    }

    /// Appends a resolved page unless it belongs to an older generation.
    pub fn apply_page(&mut self, generation: Generation, page: Page) -> PageOutcome {
        if generation != self.generation {
            debug!(%generation, current = %self.generation, "discarding stale page");
            return PageOutcome::Stale;
        }
        self.in_flight = false;
        self.error = None;
        self.pages_loaded += 1;

        let received = page.items.len();
        if page.is_short_with_more() {
            warn!(
                offset = page.offset,
                limit = page.limit,
                received,
                "page shorter than limit but reports more rows; advancing by received count"
            );
        }
        // An empty page can never move the offset, so trusting has_more here
        // would request the same slice forever.
        self.has_more = page.has_more && received > 0;
        self.next_offset += received;
        self.items.extend(page.items);
        debug!(%generation, received, total = self.items.len(), has_more = self.has_more, "page appended");
        PageOutcome::Appended { received }
    }

    /// Records a failed fetch. Loaded rows are kept and the in-flight marker is
    /// cleared so a later trigger can retry. Returns `false` for stale results.
    pub fn apply_failure(&mut self, generation: Generation, error: impl Into<String>) -> bool {
        if generation != self.generation {
            debug!(%generation, current = %self.generation, "discarding stale failure");
            return false;
        }
        let error = error.into();
        warn!(%generation, offset = self.next_offset, %error, "page fetch failed");
        self.in_flight = false;
        self.error = Some(error);
        true
    }

    pub fn items(&self) -> &[QueueJob] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&QueueJob> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn filter(&self) -> FilterState {
        self.filter
    }

    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// The listing resolved to zero rows with nothing left to fetch.
    pub fn is_empty_result(&self) -> bool {
        self.items.is_empty() && !self.has_more && !self.in_flight && self.error.is_none()
    }
}
