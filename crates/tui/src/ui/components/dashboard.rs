//! Header with aggregate queue counts.

use chrono::Utc;
use queuedeck_types::{JobStatus, QueueDashboard};
use queuedeck_util::{format_relative, format_timestamp};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::App;
use crate::ui::{
    components::component::Component,
    theme::{Theme, theme_helpers as th},
    utils::throbber_frame,
};

#[derive(Debug, Default)]
pub struct DashboardComponent;

impl Component for DashboardComponent {
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let theme = &*app.ctx.theme;
        let block = th::block(theme, Some("Queue"), false);

        let mut spans = match app.dashboard.data.as_ref() {
            Some(dashboard) => count_spans(theme, dashboard),
            None if app.dashboard.error.is_none() => vec![Span::styled("waiting for counts", theme.text_muted_style())],
            None => Vec::new(),
        };
        if app.dashboard.loading {
            spans.push(Span::styled(
                format!("  {}", throbber_frame(app.throbber_idx)),
                theme.status_info(),
            ));
        }
        if let Some(error) = app.dashboard.error.as_deref() {
            spans.push(Span::styled(format!("  counts unavailable: {error}"), theme.status_error()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), rect);
    }
}

/// `label value` pairs for the header; zero error and stale counts are muted.
pub fn count_spans(theme: &dyn Theme, dashboard: &QueueDashboard) -> Vec<Span<'static>> {
    let counts = &dashboard.status_counts;
    let mut spans = Vec::new();
    let mut push = |label: &str, value: i64, style| {
        spans.push(Span::styled(format!("{label} "), theme.text_secondary_style()));
        spans.push(Span::styled(format!("{value}   "), style));
    };
    push("Pending", counts.pending, theme.job_status_style(JobStatus::Pending));
    push("Processing", counts.processing, theme.job_status_style(JobStatus::Processing));
    push("Completed", counts.completed, theme.job_status_style(JobStatus::Completed));
    push("Review", dashboard.manual_review_count, theme.status_warning());
    let alert = |value: i64| if value > 0 { theme.status_error() } else { theme.text_muted_style() };
    push("Errors", dashboard.error_count, alert(dashboard.error_count));
    push("Stale", dashboard.stale_processing_count, alert(dashboard.stale_processing_count));

    if dashboard.updated_at.is_some() {
        spans.push(Span::styled(
            format!(
                "updated {} ({})",
                format_timestamp(dashboard.updated_at),
                format_relative(dashboard.updated_at, Utc::now())
            ),
            theme.text_muted_style(),
        ));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::NordTheme;
    use queuedeck_types::StatusCounts;

    #[test]
    fn counts_render_in_fixed_order() {
        let dashboard = QueueDashboard {
            status_counts: StatusCounts {
                pending: 4,
                processing: 2,
                completed: 90,
            },
            manual_review_count: 3,
            error_count: 1,
            ..QueueDashboard::default()
        };
        let theme = NordTheme::new();
        let text: String = count_spans(&theme, &dashboard)
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(
            text,
            "Pending 4   Processing 2   Completed 90   Review 3   Errors 1   Stale 0   "
        );
    }
}
