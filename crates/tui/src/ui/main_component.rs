use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use queuedeck_types::{Effect, Msg};
use ratatui::{
    prelude::*,
    widgets::{Block, Clear, Paragraph},
};

use super::components::{Component, DashboardComponent, DetailComponent, QueueComponent};
use super::utils::centered_rect;
use crate::app::App;

/// Root view: dashboard header, job list, hint bar and the detail modal.
#[derive(Debug, Default)]
pub struct MainView {
    pub dashboard_view: DashboardComponent,
    pub queue_view: QueueComponent,
    pub detail_view: DetailComponent,
}

impl MainView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts focus back after the focus tree changed shape (modal opened or
    /// closed).
    pub fn restore_focus(&mut self, app: &mut App) {
        if app.detail.is_open() {
            app.focus.focus(&app.detail.f_detail);
        } else {
            app.focus.focus(&app.queue.f_list);
        }
    }
}

impl Component for MainView {
    fn handle_message(&mut self, app: &mut App, msg: Msg) -> Vec<Effect> {
        app.update(&msg)
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if app.detail.is_open() {
            return self.detail_view.handle_key_events(app, key);
        }
        if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::NONE {
            return vec![Effect::Quit];
        }
        self.queue_view.handle_key_events(app, key)
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if app.detail.is_open() {
            return self.detail_view.handle_mouse_events(app, mouse);
        }
        self.queue_view.handle_mouse_events(app, mouse)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        let bg_fill = Paragraph::new("").style(Style::default().bg(app.ctx.theme.roles().background));
        frame.render_widget(bg_fill, area);

        let [header_area, queue_area, hints_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(6), Constraint::Length(1)]).areas(area);
        self.dashboard_view.render(frame, header_area, app);
        self.queue_view.render(frame, queue_area, app);

        let hints = Paragraph::new(Line::from(self.get_hint_spans(app)));
        frame.render_widget(hints, hints_area);

        if app.detail.is_open() {
            frame.render_widget(
                Block::default().style(app.ctx.theme.modal_background_style()).dim(),
                frame.area(),
            );
            let modal_area = centered_rect(80, 80, area);
            frame.render_widget(Clear, modal_area);
            self.detail_view.render(frame, modal_area, app);
        }
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        let mut hint_spans = vec![Span::styled("Hints: ", app.ctx.theme.text_muted_style())];
        if app.detail.is_open() {
            hint_spans.extend(self.detail_view.get_hint_spans(app));
        } else {
            hint_spans.extend(self.queue_view.get_hint_spans(app));
        }
        hint_spans
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::tests::{FixedSource, test_app};

    #[test]
    fn quit_and_modal_routing() {
        let mut app = test_app(Arc::new(FixedSource::default()));
        let mut view = MainView::new();
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(view.handle_key_events(&mut app, q), vec![Effect::Quit]);

        app.detail.open(7);
        assert_eq!(view.handle_key_events(&mut app, q), vec![Effect::CloseDetail]);
    }
}
