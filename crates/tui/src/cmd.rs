//! # Command Execution Layer
//!
//! Translates [`Effect`]s into imperative work. Local effects (debounce timer,
//! query string, detail modal, quit) are applied on the spot; network effects
//! become [`Cmd`]s that run as spawned tasks and report back with a [`Msg`].
//!
//! State updates stay synchronous and pure; this module is the imperative
//! shell around them.

use std::sync::Arc;

use queuedeck_api::QueueSource;
use queuedeck_types::{Effect, Msg, PageRequest};
use queuedeck_util::redact_sensitive;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::App;
use crate::ui::debounce::DebounceTimer;

/// Network work produced by effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Fetch one page of the list.
    FetchPage(PageRequest),
    FetchDashboard,
    /// Fetch the detail record for an activated job.
    FetchDetail(i64),
}

/// Result of applying a batch of effects.
#[derive(Debug, Default)]
pub struct CommandBatch {
    pub cmds: Vec<Cmd>,
    pub quit: bool,
}

/// Applies local effects and collects the network commands.
pub fn from_effects(app: &mut App, debounce: &mut DebounceTimer, effects: Vec<Effect>) -> CommandBatch {
    let mut batch = CommandBatch::default();
    for effect in effects {
        match effect {
            Effect::FetchPage(request) => {
                debug!(
                    generation = %request.generation,
                    offset = request.offset,
                    limit = request.limit,
                    "fetching page"
                );
                batch.cmds.push(Cmd::FetchPage(request));
            }
            Effect::ScheduleFilterCommit(delay) => debounce.schedule(delay),
            Effect::CancelFilterCommit => debounce.cancel(),
            Effect::SyncQueryString(query) => app.share_query = query,
            Effect::ActivateJob(id) => {
                app.detail.open(id);
                batch.cmds.push(Cmd::FetchDetail(id));
            }
            Effect::FetchDashboard => {
                app.dashboard.loading = true;
                batch.cmds.push(Cmd::FetchDashboard);
            }
            Effect::CloseDetail => app.detail.close(),
            Effect::Quit => batch.quit = true,
        }
    }
    batch
}

/// Spawns each command on the runtime.
pub fn spawn_cmds(source: &Arc<dyn QueueSource>, cmds: Vec<Cmd>) -> Vec<JoinHandle<Msg>> {
    cmds.into_iter()
        .map(|cmd| tokio::spawn(run_cmd(Arc::clone(source), cmd)))
        .collect()
}

/// Executes one command. Errors are turned into failure messages with
/// credentials redacted.
pub async fn run_cmd(source: Arc<dyn QueueSource>, cmd: Cmd) -> Msg {
    match cmd {
        Cmd::FetchPage(request) => match source.list_jobs(&request.filter, request.offset, request.limit).await {
            Ok(page) => {
                debug!(
                    generation = %request.generation,
                    received = page.items.len(),
                    has_more = page.has_more,
                    "page resolved"
                );
                Msg::PageLoaded {
                    generation: request.generation,
                    page,
                }
            }
            Err(error) => {
                let error = redact_sensitive(&error.to_string());
                warn!(generation = %request.generation, offset = request.offset, %error, "page fetch failed");
                Msg::PageFailed {
                    generation: request.generation,
                    error,
                }
            }
        },
        Cmd::FetchDashboard => match source.dashboard().await {
            Ok(dashboard) => Msg::DashboardLoaded(dashboard),
            Err(error) => Msg::DashboardFailed(redact_sensitive(&error.to_string())),
        },
        Cmd::FetchDetail(id) => match source.job_detail(id).await {
            Ok(detail) => Msg::DetailLoaded(Box::new(detail)),
            Err(error) => {
                let error = redact_sensitive(&error.to_string());
                warn!(id, %error, "job detail fetch failed");
                Msg::DetailFailed { id, error }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use queuedeck_api::ApiError;
    use queuedeck_types::{FilterState, JobStatus, Page, QueueDashboard, QueueJob, QueueJobDetail, StatusFilter};

    use super::*;
    use crate::app::tests::{FixedSource, test_app};

    /// Answers after `delay`; pending-filtered listings use ids from 1000.
    struct SlowSource {
        delay: Duration,
        total: usize,
    }

    #[async_trait]
    impl QueueSource for SlowSource {
        async fn list_jobs(&self, filter: &FilterState, offset: usize, limit: usize) -> Result<Page, ApiError> {
            tokio::time::sleep(self.delay).await;
            let base = if filter.status == StatusFilter::Only(JobStatus::Pending) { 1000 } else { 0 };
            let end = (offset + limit).min(self.total);
            let items = (offset..end)
                .map(|index| serde_json::from_value::<QueueJob>(serde_json::json!({ "id": base + index })))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Page {
                items,
                offset,
                limit,
                has_more: end < self.total,
            })
        }

        async fn dashboard(&self) -> Result<QueueDashboard, ApiError> {
            Err(ApiError::Status {
                status: 401,
                message: "Authorization: Bearer leaked-token".into(),
                code: None,
                request_id: None,
            })
        }

        async fn job_detail(&self, id: i64) -> Result<QueueJobDetail, ApiError> {
            Err(ApiError::Status {
                status: 404,
                message: format!("job {id} not found"),
                code: None,
                request_id: None,
            })
        }
    }

    fn page_requests(cmds: &[Cmd]) -> usize {
        cmds.iter().filter(|cmd| matches!(cmd, Cmd::FetchPage(_))).count()
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_page_request_in_flight() {
        let source: Arc<dyn QueueSource> = Arc::new(SlowSource {
            delay: Duration::from_millis(500),
            total: 500,
        });
        let mut app = test_app(Arc::clone(&source));
        let mut debounce = DebounceTimer::default();
        app.queue.set_viewport_height(60);

        let effects = app.queue.mount();
        let batch = from_effects(&mut app, &mut debounce, effects);
        assert_eq!(page_requests(&batch.cmds), 1);
        let handles = spawn_cmds(&source, batch.cmds);

        // Renders and scrolls while the request is outstanding add nothing.
        for _ in 0..5 {
            app.queue.scroll_by(1);
            let effects = app.queue.after_render();
            let batch = from_effects(&mut app, &mut debounce, effects);
            assert_eq!(page_requests(&batch.cmds), 0);
        }

        for handle in handles {
            let msg = handle.await.expect("task");
            app.update(&msg);
        }
        assert_eq!(app.queue.pagination.len(), 50);
        assert!(!app.queue.pagination.is_in_flight());

        // The viewport covers the tail, so the next render prefetches.
        let effects = app.queue.after_render();
        let batch = from_effects(&mut app, &mut debounce, effects);
        assert_eq!(batch.cmds.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_page_from_previous_filter_is_discarded() {
        let source: Arc<dyn QueueSource> = Arc::new(SlowSource {
            delay: Duration::from_millis(200),
            total: 30,
        });
        let mut app = test_app(Arc::clone(&source));
        let mut debounce = DebounceTimer::default();

        let effects = app.queue.mount();
        let first = spawn_cmds(&source, from_effects(&mut app, &mut debounce, effects).cmds);
        let effects = app.queue.set_status(StatusFilter::Only(JobStatus::Pending));
        from_effects(&mut app, &mut debounce, effects);
        assert!(debounce.is_armed());
        debounce.fired().await;
        let effects = app.update(&Msg::FilterDebounceElapsed);
        let batch = from_effects(&mut app, &mut debounce, effects);
        assert_eq!(app.share_query, "status=pending");
        let second = spawn_cmds(&source, batch.cmds);

        for handle in first.into_iter().chain(second) {
            let msg = handle.await.expect("task");
            app.update(&msg);
        }
        assert_eq!(app.queue.pagination.len(), 30);
        assert!(app.queue.items().iter().all(|job| job.id >= 1000));
    }

    #[tokio::test]
    async fn failures_become_redacted_messages() {
        let source: Arc<dyn QueueSource> = Arc::new(SlowSource {
            delay: Duration::ZERO,
            total: 0,
        });
        let Msg::DashboardFailed(error) = run_cmd(Arc::clone(&source), Cmd::FetchDashboard).await else {
            panic!("expected dashboard failure");
        };
        assert!(!error.contains("leaked-token"));
        assert!(error.contains("[REDACTED]"));

        let msg = run_cmd(source, Cmd::FetchDetail(9)).await;
        assert!(matches!(msg, Msg::DetailFailed { id: 9, ref error } if error.contains("404")));
    }

    #[test]
    fn local_effects_apply_without_commands() {
        let mut app = test_app(Arc::new(FixedSource::default()));
        let mut debounce = DebounceTimer::default();
        let batch = from_effects(
            &mut app,
            &mut debounce,
            vec![
                Effect::ScheduleFilterCommit(Duration::from_millis(300)),
                Effect::SyncQueryString("review=true".into()),
                Effect::ActivateJob(5),
                Effect::Quit,
            ],
        );
        assert!(debounce.is_armed());
        assert_eq!(app.share_query, "review=true");
        assert_eq!(app.detail.requested(), Some(5));
        assert_eq!(batch.cmds, vec![Cmd::FetchDetail(5)]);
        assert!(batch.quit);

        let batch = from_effects(&mut app, &mut debounce, vec![Effect::CancelFilterCommit, Effect::CloseDetail]);
        assert!(batch.cmds.is_empty());
        assert!(!debounce.is_armed());
        assert!(!app.detail.is_open());
    }
}
