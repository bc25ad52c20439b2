//! Modal with the full record of an activated job.

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use queuedeck_types::{Effect, QueueJobDetail};
use queuedeck_util::{PLACEHOLDER, format_relative, format_timestamp, or_placeholder};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::app::App;
use crate::ui::{
    components::component::Component,
    theme::{Theme, theme_helpers as th},
    utils::throbber_frame,
};

const PAGE_STEP: i16 = 10;

#[derive(Debug, Default)]
pub struct DetailComponent;

impl Component for DetailComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return vec![Effect::CloseDetail],
            KeyCode::Up | KeyCode::Char('k') => app.detail.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => app.detail.scroll_by(1),
            KeyCode::PageUp => app.detail.scroll_by(-PAGE_STEP),
            KeyCode::PageDown => app.detail.scroll_by(PAGE_STEP),
            KeyCode::Home | KeyCode::Char('g') => app.detail.scroll = 0,
            _ => {}
        }
        Vec::new()
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        match mouse.kind {
            MouseEventKind::ScrollDown => app.detail.scroll_by(3),
            MouseEventKind::ScrollUp => app.detail.scroll_by(-3),
            _ => {}
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let Some(id) = app.detail.requested() else {
            return;
        };
        let title = format!("Job #{id}");
        let theme = &*app.ctx.theme;
        let block = th::block(theme, Some(title.as_str()), true);

        let lines = if let Some(detail) = app.detail.detail.as_deref() {
            detail_lines(theme, detail)
        } else if let Some(error) = app.detail.error.as_deref() {
            vec![Line::from(Span::styled(
                format!("Failed to load job #{id}: {error}"),
                theme.status_error(),
            ))]
        } else {
            vec![Line::from(Span::styled(
                format!("{} Loading job #{id}…", throbber_frame(app.throbber_idx)),
                theme.text_muted_style(),
            ))]
        };

        let max_scroll = lines.len().saturating_sub(1).min(u16::MAX as usize) as u16;
        app.detail.scroll = app.detail.scroll.min(max_scroll);
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((app.detail.scroll, 0));
        frame.render_widget(paragraph, rect);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        th::build_hint_spans(&*app.ctx.theme, &[("↑/↓", " scroll  "), ("Esc", " close ")])
    }
}

fn field(theme: &dyn Theme, label: &str, value: impl Into<String>, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<20}"), theme.text_secondary_style()),
        Span::styled(value.into(), style),
    ])
}

fn section(theme: &dyn Theme, title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        theme.accent_primary_style().add_modifier(Modifier::BOLD),
    ))
}

/// Lines shown for a loaded job; missing values render as the placeholder.
pub fn detail_lines(theme: &dyn Theme, detail: &QueueJobDetail) -> Vec<Line<'static>> {
    let job = &detail.job;
    let text = theme.text_primary_style();
    let now = Utc::now();

    let review = if job.requires_manual_review {
        match job.manual_review_reason.as_deref() {
            Some(reason) => format!("yes ({reason})"),
            None => "yes".to_string(),
        }
    } else {
        "no".to_string()
    };
    let latency = detail
        .llm_latency_ms
        .map(|ms| format!("{ms} ms"))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let next_retry = match job.next_retry_at {
        Some(_) => format!(
            "{} ({})",
            format_timestamp(job.next_retry_at),
            format_relative(job.next_retry_at, now)
        ),
        None => PLACEHOLDER.to_string(),
    };

    let mut lines = vec![
        field(theme, "ID", job.id.to_string(), text),
        field(theme, "Message ID", or_placeholder(job.message_id.as_deref()), text),
        field(theme, "Status", job.status.to_string(), theme.job_status_style(job.status)),
        field(theme, "Priority", job.priority.to_string(), text),
        field(theme, "Retries", job.retry_count.to_string(), text),
        field(theme, "Manual review", review, if job.requires_manual_review { theme.status_warning() } else { text }),
        field(theme, "Decision reason", or_placeholder(job.decision_reason.as_deref()), text),
        field(theme, "Final method", or_placeholder(job.final_method.as_deref()), text),
        field(theme, "LLM latency", latency, text),
        field(theme, "Created", format_timestamp(job.created_at), text),
        field(theme, "Updated", format_timestamp(job.updated_at), text),
        field(theme, "Processing started", format_timestamp(detail.processing_started_at), text),
        field(theme, "Completed", format_timestamp(detail.completed_at), text),
        field(theme, "Next retry", next_retry, text),
    ];

    if let Some(error) = detail.last_error.as_deref() {
        lines.push(Line::default());
        lines.push(section(theme, "Last error"));
        lines.extend(error.lines().map(|line| Line::from(Span::styled(line.to_string(), theme.status_error()))));
    }

    if let Some(partial) = detail.partial_fields.as_ref().filter(|value| !value.is_null()) {
        lines.push(Line::default());
        lines.push(section(theme, "Partial fields"));
        let pretty = serde_json::to_string_pretty(partial).unwrap_or_else(|_| partial.to_string());
        lines.extend(pretty.lines().map(|line| Line::from(Span::styled(line.to_string(), text))));
    }

    if let Some(preview) = detail.source_preview.as_deref() {
        lines.push(Line::default());
        lines.push(section(theme, "Source preview"));
        lines.extend(
            preview
                .lines()
                .map(|line| Line::from(Span::styled(line.to_string(), theme.text_muted_style()))),
        );
    }

    lines
}
