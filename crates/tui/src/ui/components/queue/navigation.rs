//! Single active-row pointer driven by the keyboard.

/// Navigation input, already decoded from key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Home,
    End,
    /// Move up by the given number of rows.
    PageUp(usize),
    /// Move down by the given number of rows.
    PageDown(usize),
    Activate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Unchanged,
    /// The active index changed to this value.
    Moved(usize),
    /// The active row was activated; the index is unchanged.
    Activate(usize),
}

/// `None` is the no-selection state.
///
/// Invariant: with `len` loaded rows, `active` is `None` when `len == 0` and
/// otherwise either `None` or `< len`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationState {
    active: Option<usize>,
}

impl NavigationState {
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn handle(&mut self, key: NavKey, len: usize) -> NavOutcome {
        if len == 0 {
            self.active = None;
            return NavOutcome::Unchanged;
        }
        let last = len - 1;
        let target = match (key, self.active) {
            (NavKey::Activate, Some(index)) => return NavOutcome::Activate(index),
            (NavKey::Activate, None) => return NavOutcome::Unchanged,
            // Entering the list from no-selection always lands on the first row.
            (NavKey::Up | NavKey::Down | NavKey::PageUp(_) | NavKey::PageDown(_), None) => 0,
            (NavKey::Down, Some(index)) => (index + 1).min(last),
            (NavKey::Up, Some(index)) => index.saturating_sub(1),
            (NavKey::PageDown(step), Some(index)) => index.saturating_add(step.max(1)).min(last),
            (NavKey::PageUp(step), Some(index)) => index.saturating_sub(step.max(1)),
            (NavKey::Home, _) => 0,
            (NavKey::End, _) => last,
        };
        self.move_to(target)
    }

    /// Selects `index` directly (mouse click), clamped to the loaded rows.
    pub fn select(&mut self, index: usize, len: usize) -> NavOutcome {
        if len == 0 {
            self.active = None;
            return NavOutcome::Unchanged;
        }
        self.move_to(index.min(len - 1))
    }

    /// Keeps the invariant after the row count changed. Growth preserves
    /// the active index; an empty sequence forces no-selection.
    pub fn on_len_changed(&mut self, len: usize) {
        self.active = match self.active {
            _ if len == 0 => None,
            Some(index) => Some(index.min(len - 1)),
            None => None,
        };
    }

    /// Filter-driven reset.
    pub fn reset(&mut self) {
        self.active = None;
    }

    fn move_to(&mut self, target: usize) -> NavOutcome {
        if self.active == Some(target) {
            return NavOutcome::Unchanged;
        }
        self.active = Some(target);
        NavOutcome::Moved(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_down_from_no_selection_enters_first_row() {
        let mut nav = NavigationState::default();
        assert_eq!(nav.handle(NavKey::Down, 3), NavOutcome::Moved(0));
        assert_eq!(nav.handle(NavKey::Down, 3), NavOutcome::Moved(1));
    }

    #[test]
    fn moves_clamp_at_both_ends() {
        let mut nav = NavigationState::default();
        nav.handle(NavKey::Down, 2);
        assert_eq!(nav.handle(NavKey::Up, 2), NavOutcome::Unchanged);
        assert_eq!(nav.handle(NavKey::End, 2), NavOutcome::Moved(1));
        assert_eq!(nav.handle(NavKey::Down, 2), NavOutcome::Unchanged);
        assert_eq!(nav.active(), Some(1));
        assert_eq!(nav.handle(NavKey::Home, 2), NavOutcome::Moved(0));
    }

    #[test]
    fn paging_moves_by_step() {
        let mut nav = NavigationState::default();
        nav.handle(NavKey::Home, 100);
        assert_eq!(nav.handle(NavKey::PageDown(20), 100), NavOutcome::Moved(20));
        assert_eq!(nav.handle(NavKey::PageDown(200), 100), NavOutcome::Moved(99));
        assert_eq!(nav.handle(NavKey::PageUp(30), 100), NavOutcome::Moved(69));
        assert_eq!(nav.handle(NavKey::PageUp(0), 100), NavOutcome::Moved(68));
    }

    #[test]
    fn activate_reports_index_without_moving() {
        let mut nav = NavigationState::default();
        assert_eq!(nav.handle(NavKey::Activate, 5), NavOutcome::Unchanged);
        nav.handle(NavKey::End, 5);
        assert_eq!(nav.handle(NavKey::Activate, 5), NavOutcome::Activate(4));
        assert_eq!(nav.active(), Some(4));
    }

    #[test]
    fn empty_sequence_forces_no_selection() {
        let mut nav = NavigationState::default();
        nav.handle(NavKey::End, 10);
        nav.on_len_changed(0);
        assert_eq!(nav.active(), None);
        assert_eq!(nav.handle(NavKey::Down, 0), NavOutcome::Unchanged);
        assert_eq!(nav.active(), None);
    }

    #[test]
    fn growth_preserves_active_index() {
        let mut nav = NavigationState::default();
        nav.handle(NavKey::End, 50);
        nav.on_len_changed(100);
        assert_eq!(nav.active(), Some(49));
    }

    #[test]
    fn select_clamps_to_loaded_rows() {
        let mut nav = NavigationState::default();
        assert_eq!(nav.select(12, 5), NavOutcome::Moved(4));
        assert_eq!(nav.select(4, 5), NavOutcome::Unchanged);
    }
}
