//! Pending versus committed filter state.
//!
//! Edits only touch the pending copy. The debounce timer itself lives in the
//! runtime; this type decides what a commit means.

use std::time::Duration;

use queuedeck_types::FilterState;

#[derive(Debug, Clone)]
pub struct FilterSynchronizer {
    pending: FilterState,
    committed: FilterState,
    debounce: Duration,
}

impl FilterSynchronizer {
    pub fn new(initial: FilterState, debounce: Duration) -> Self {
        Self {
            pending: initial,
            committed: initial,
            debounce,
        }
    }

    pub fn pending(&self) -> FilterState {
        self.pending
    }

    pub fn committed(&self) -> FilterState {
        self.committed
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Whether the pending copy differs from what is being shown.
    pub fn is_dirty(&self) -> bool {
        self.pending != self.committed
    }

    /// Applies an edit to the pending copy and returns the quiet period to
    /// (re)arm the commit timer with.
    pub fn edit(&mut self, edit: impl FnOnce(&mut FilterState)) -> Duration {
        edit(&mut self.pending);
        self.debounce
    }

    /// Replaces the pending copy wholesale.
    pub fn set_pending(&mut self, filter: FilterState) {
        self.pending = filter;
    }

    /// Promotes pending to committed. `None` when they are already equal.
    pub fn commit(&mut self) -> Option<FilterState> {
        if self.pending == self.committed {
            return None;
        }
        self.committed = self.pending;
        Some(self.committed)
    }
}
