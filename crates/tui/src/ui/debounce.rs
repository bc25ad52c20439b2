//! Single cancellable delayed task for filter commits.

use std::time::Duration;

use tokio::time::{self, Instant};

/// One optional deadline. Scheduling again replaces the previous deadline,
/// so only the trailing edit in a burst survives.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn schedule(&mut self, after: Duration) {
        self.deadline = Some(Instant::now() + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the deadline passes and disarms the timer. Pends forever
    /// while disarmed, so it can sit in a `select!` guarded by
    /// [`DebounceTimer::is_armed`].
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
