//! Job list view: filter bar, virtualized table and status line.
//!
//! Only the render range reported by the virtualizer is formatted and
//! measured; rows are drawn from the first visible index so the table never
//! materializes the whole loaded sequence.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use queuedeck_types::{Effect, JobStatus, StatusFilter};
use queuedeck_util::truncate_with_ellipsis;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Modifier,
    text::{Line, Span, Text},
    widgets::{Cell, Paragraph, Row, Table, TableState, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::{NavKey, NavOutcome, row_cache::RowCells};
use crate::app::App;
use crate::ui::{
    components::{common::scrollbar::render_vertical_scrollbar, component::Component},
    theme::{Theme, theme_helpers as th},
    utils::throbber_frame,
};

const WHEEL_STEP: i32 = 3;
const HEADER_HEIGHT: u16 = 1;
const COLUMN_TITLES: [&str; 8] = ["ID", "Status", "Pri", "Retries", "Review", "Message", "Updated", "Next retry"];

#[derive(Debug, Default)]
pub struct QueueComponent {
    layout: QueueLayout,
}

#[derive(Debug, Default, Clone, Copy)]
struct QueueLayout {
    filter_area: Rect,
    list_area: Rect,
}

impl QueueComponent {
    fn handle_filter_keys(&self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.queue.cycle_status(false),
            KeyCode::Right | KeyCode::Char('l') => app.queue.cycle_status(true),
            KeyCode::Char(' ') => app.queue.toggle_review_only(),
            KeyCode::Enter => app.queue.apply_now(),
            KeyCode::Down | KeyCode::Esc => {
                app.focus.focus(&app.queue.f_list);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_list_keys(&self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let page = app.queue.page_step();
        let nav = match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(NavKey::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(NavKey::Down),
            KeyCode::Home | KeyCode::Char('g') => Some(NavKey::Home),
            KeyCode::End | KeyCode::Char('G') => Some(NavKey::End),
            KeyCode::PageUp => Some(NavKey::PageUp(page)),
            KeyCode::PageDown => Some(NavKey::PageDown(page)),
            KeyCode::Enter | KeyCode::Char(' ') => Some(NavKey::Activate),
            _ => None,
        };
        if let Some(nav) = nav {
            return navigate(app, nav);
        }
        match key.code {
            KeyCode::Char('r') => app.queue.retry(),
            KeyCode::Char('/') | KeyCode::Char('f') => {
                app.focus.focus(&app.queue.f_filters);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = &*app.ctx.theme;
        let block = th::block(theme, Some("Filters"), app.queue.f_filters.get());
        let pending = app.queue.filters.pending();

        let mut spans = vec![Span::styled("Status ", theme.text_secondary_style())];
        for option in StatusFilter::CYCLE {
            let label = format!(" {option} ");
            if option == pending.status {
                spans.push(Span::styled(label, theme.selection_style().add_modifier(Modifier::BOLD)));
            } else {
                spans.push(Span::styled(label, theme.text_muted_style()));
            }
        }
        let checkbox = if pending.requires_manual_review { "[x]" } else { "[ ]" };
        spans.push(Span::styled("   Review only ", theme.text_secondary_style()));
        spans.push(Span::styled(checkbox, theme.accent_primary_style()));
        if app.queue.filters.is_dirty() {
            spans.push(Span::styled("   applying…", theme.status_warning()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect, app: &mut App) {
        let title = format!(
            "Jobs ({}{})",
            app.queue.pagination.len(),
            if app.queue.pagination.has_more() { "+" } else { "" }
        );
        let block = th::block(&*app.ctx.theme, Some(title.as_str()), app.queue.f_list.get());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let body = Rect {
            y: inner.y.saturating_add(HEADER_HEIGHT),
            height: inner.height.saturating_sub(HEADER_HEIGHT),
            ..inner
        };
        app.queue.list_area = body;
        app.queue.set_viewport_height(body.height);

        if app.queue.pagination.is_empty() {
            render_placeholder(frame, inner, app);
            return;
        }

        let measured: Vec<(usize, u16)> = app
            .queue
            .virtualizer
            .render_range()
            .filter(|index| !app.queue.virtualizer.registry().is_measured(*index))
            .filter_map(|index| {
                let job = app.queue.pagination.item(index)?;
                Some((index, app.queue.rows.get_or_format(job).height()))
            })
            .collect();
        for (index, height) in measured {
            app.queue.record_row_height(index, height);
        }

        let range = app.queue.virtualizer.render_range();
        let first = app
            .queue
            .virtualizer
            .window()
            .map(|window| window.first_visible)
            .unwrap_or(range.start);
        app.queue.rows.retain_range(app.queue.pagination.items(), range.clone());

        let theme = &*app.ctx.theme;
        let now = Utc::now();
        let mut rows = Vec::with_capacity(range.end.saturating_sub(first));
        for index in first..range.end {
            let Some(job) = app.queue.pagination.item(index) else {
                break;
            };
            let cells = app.queue.rows.get_or_format(job);
            rows.push(build_row(theme, index, job.status, cells, now));
        }

        let header = Row::new(COLUMN_TITLES.map(|title| Cell::from(title).style(th::table_header_style(theme))))
            .style(th::table_header_row_style(theme))
            .height(HEADER_HEIGHT);
        let widths = [
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Length(4),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Fill(1),
            Constraint::Length(16),
            Constraint::Length(11),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(th::table_selected_style(theme));
        let selected = app
            .queue
            .navigation
            .active()
            .filter(|index| (first..range.end).contains(index))
            .map(|index| index - first);
        let mut table_state = TableState::default().with_selected(selected);
        frame.render_stateful_widget(table, inner, &mut table_state);

        render_vertical_scrollbar(
            frame,
            body,
            theme,
            app.queue.virtualizer.total_extent() as usize,
            app.queue.virtualizer.scroll_offset() as usize,
            body.height as usize,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = &*app.ctx.theme;
        let pagination = &app.queue.pagination;
        let query = if app.share_query.is_empty() {
            "no filters".to_string()
        } else {
            format!("?{}", app.share_query)
        };
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(query.width() as u16 + 1)]).areas(area);

        let mut spans = Vec::new();
        if let Some(error) = pagination.error() {
            let message = format!("⚠ {error} (r to retry)");
            spans.push(Span::styled(
                truncate_with_ellipsis(&message, left.width as usize),
                theme.status_error(),
            ));
        } else if pagination.is_in_flight() {
            spans.push(Span::styled(
                format!("{} loading page {}", throbber_frame(app.throbber_idx), pagination.pages_loaded() + 1),
                theme.status_info(),
            ));
        } else if pagination.has_more() {
            spans.push(Span::styled(
                format!("{} loaded, more available", pagination.len()),
                theme.text_muted_style(),
            ));
        } else {
            spans.push(Span::styled(
                format!("{} loaded, end of list", pagination.len()),
                theme.text_muted_style(),
            ));
        }
        if let Some(active) = app.queue.navigation.active() {
            spans.push(Span::styled(
                format!("  row {}/{}", active + 1, pagination.len()),
                theme.text_secondary_style(),
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), left);
        frame.render_widget(Paragraph::new(query).style(theme.accent_primary_style()), right);
    }
}

impl Component for QueueComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => return app.queue.refresh(),
            KeyCode::Tab => {
                app.focus.next();
                return Vec::new();
            }
            KeyCode::BackTab => {
                app.focus.prev();
                return Vec::new();
            }
            KeyCode::Char('c') if key.modifiers.is_empty() => return app.queue.clear_filters(),
            _ => {}
        }
        if app.queue.f_filters.get() {
            self.handle_filter_keys(app, key)
        } else {
            self.handle_list_keys(app, key)
        }
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        let position = Position::new(mouse.column, mouse.row);
        let in_list = self.layout.list_area.contains(position);
        match mouse.kind {
            MouseEventKind::ScrollDown if in_list => app.queue.scroll_by(WHEEL_STEP),
            MouseEventKind::ScrollUp if in_list => app.queue.scroll_by(-WHEEL_STEP),
            MouseEventKind::Down(MouseButton::Left) if in_list => {
                app.focus.focus(&app.queue.f_list);
                if let Some(index) = app.queue.index_at_row(mouse.row) {
                    // A second click on the active row opens it.
                    if app.queue.navigation.active() == Some(index) {
                        return navigate(app, NavKey::Activate);
                    }
                    app.queue.select_index(index);
                }
            }
            MouseEventKind::Down(MouseButton::Left) if self.layout.filter_area.contains(position) => {
                app.focus.focus(&app.queue.f_filters);
            }
            _ => {}
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let [filter_area, list_area, status_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)]).areas(rect);
        self.layout = QueueLayout { filter_area, list_area };

        self.render_filters(frame, filter_area, app);
        self.render_list(frame, list_area, app);
        self.render_status(frame, status_area, app);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        let hints: &[(&str, &str)] = if app.queue.f_filters.get() {
            &[
                ("←/→", " status  "),
                ("Space", " review  "),
                ("Enter", " apply  "),
                ("c", " clear  "),
                ("Tab", " list  "),
            ]
        } else {
            &[
                ("↑/↓", " move  "),
                ("PgUp/PgDn", " page  "),
                ("Enter", " open  "),
                ("r", " retry  "),
                ("Ctrl+R", " refresh  "),
                ("Tab", " filters  "),
                ("q", " quit "),
            ]
        };
        th::build_hint_spans(&*app.ctx.theme, hints)
    }
}

/// Applies a navigation key; any move pulls input focus to the list.
fn navigate(app: &mut App, key: NavKey) -> Vec<Effect> {
    let (outcome, effects) = app.queue.navigate(key);
    if matches!(outcome, NavOutcome::Moved(_)) {
        app.focus.focus(&app.queue.f_list);
    }
    effects
}

fn build_row(theme: &dyn Theme, index: usize, status: JobStatus, cells: &RowCells, now: DateTime<Utc>) -> Row<'static> {
    let message = match &cells.review_reason {
        Some(reason) => Text::from(vec![
            Line::from(cells.message_id.clone()),
            Line::from(Span::styled(format!("↳ {reason}"), theme.status_warning())),
        ]),
        None => Text::from(cells.message_id.clone()),
    };
    Row::new(vec![
        Cell::from(cells.id.clone()),
        Cell::from(Span::styled(cells.status.clone(), theme.job_status_style(status))),
        Cell::from(cells.priority.clone()),
        Cell::from(cells.retries.clone()),
        Cell::from(Span::styled(cells.review.clone(), theme.status_warning())),
        Cell::from(message),
        Cell::from(cells.updated.clone()),
        Cell::from(cells.next_retry(now)),
    ])
    .height(cells.height())
    .style(th::table_row_style(theme, index))
}

/// Loading, error and empty states for a list with no rows.
fn render_placeholder(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &*app.ctx.theme;
    let pagination = &app.queue.pagination;
    let (text, style) = if let Some(error) = pagination.error() {
        (format!("Failed to load jobs: {error}\nPress r to retry."), theme.status_error())
    } else if pagination.is_in_flight() || pagination.has_more() {
        (format!("{} Loading jobs…", throbber_frame(app.throbber_idx)), theme.text_muted_style())
    } else if pagination.filter().is_narrowed() {
        (
            "No jobs match the current filters. Press c to clear them.".to_string(),
            theme.text_muted_style(),
        )
    } else {
        ("The queue is empty.".to_string(), theme.text_muted_style())
    };
    let paragraph = Paragraph::new(text).style(style).wrap(Wrap { trim: true }).centered();
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::tests::{FixedSource, test_app};
    use queuedeck_types::{Page, PageRequest, QueueJob};
    use ratatui::{Terminal, backend::TestBackend};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn serve(request: &PageRequest, total: usize) -> Page {
        let end = (request.offset + request.limit).min(total);
        Page {
            items: (request.offset..end)
                .map(|id| serde_json::from_value::<QueueJob>(serde_json::json!({ "id": id })).expect("job"))
                .collect(),
            offset: request.offset,
            limit: request.limit,
            has_more: end < total,
        }
    }

    fn loaded_app(total: usize) -> App {
        let mut app = test_app(Arc::new(FixedSource { total }));
        let effects = app.mount();
        let Some(Effect::FetchPage(request)) = effects.first() else {
            panic!("expected first page request, got {effects:?}");
        };
        app.queue.page_loaded(request.generation, serve(request, total));
        app
    }

    fn draw(component: &mut QueueComponent, app: &mut App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).expect("terminal");
        terminal
            .draw(|frame| component.render(frame, frame.area(), app))
            .expect("draw");
        terminal
    }

    #[test]
    fn render_sizes_viewport_and_formats_only_the_render_range() {
        let mut app = loaded_app(50);
        let mut component = QueueComponent::default();
        draw(&mut component, &mut app);

        // 20 rows: 3 filter + 1 status leaves 16; minus borders and header.
        assert_eq!(app.queue.virtualizer.viewport_height(), 13);
        let range = app.queue.virtualizer.render_range();
        assert_eq!(range, 0..16);
        assert_eq!(app.queue.rows.len(), range.len());
        assert!(app.queue.after_render().is_empty());
    }

    #[test]
    fn end_key_focuses_list_and_reaches_prefetch_edge() {
        let mut app = loaded_app(500);
        let mut component = QueueComponent::default();
        draw(&mut component, &mut app);
        app.focus.focus(&app.queue.f_filters);

        component.handle_key_events(&mut app, key(KeyCode::Tab));
        component.handle_key_events(&mut app, key(KeyCode::End));
        assert_eq!(app.queue.navigation.active(), Some(49));
        draw(&mut component, &mut app);
        let effects = app.queue.after_render();
        assert!(matches!(effects.as_slice(), [Effect::FetchPage(request)] if request.offset == 50));
    }

    #[test]
    fn filter_keys_schedule_commits_without_resetting() {
        let mut app = loaded_app(50);
        let mut component = QueueComponent::default();
        app.focus.focus(&app.queue.f_filters);

        let effects = component.handle_key_events(&mut app, key(KeyCode::Right));
        assert!(matches!(effects.as_slice(), [Effect::ScheduleFilterCommit(_)]));
        component.handle_key_events(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.queue.pagination.len(), 50);

        let effects = component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert_eq!(effects[0], Effect::CancelFilterCommit);
        assert_eq!(effects[1], Effect::SyncQueryString("status=pending&review=true".into()));
    }

    #[test]
    fn enter_on_active_row_activates_it() {
        let mut app = loaded_app(50);
        let mut component = QueueComponent::default();
        component.handle_key_events(&mut app, key(KeyCode::Down));
        component.handle_key_events(&mut app, key(KeyCode::Char('j')));
        let effects = component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert_eq!(effects, vec![Effect::ActivateJob(1)]);
    }

    #[test]
    fn empty_result_renders_empty_state() {
        let mut app = loaded_app(0);
        let mut component = QueueComponent::default();
        let terminal = draw(&mut component, &mut app);
        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("The queue is empty."));
    }
}
