//! Themed vertical scrollbar.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use crate::ui::theme::roles::Theme;

/// Renders a vertical scrollbar on the right edge of `area`.
///
/// Lengths are in terminal rows: `content_length` is the total extent,
/// `position` the scroll offset, `viewport_length` the visible height.
/// Nothing is drawn when the content fits.
pub fn render_vertical_scrollbar(
    frame: &mut Frame,
    area: Rect,
    theme: &dyn Theme,
    content_length: usize,
    position: usize,
    viewport_length: usize,
) {
    if viewport_length == 0 || content_length <= viewport_length {
        return;
    }
    let mut scrollbar_state = ScrollbarState::new(content_length.saturating_sub(viewport_length))
        .position(position)
        .viewport_content_length(viewport_length);
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(None)
        .end_symbol(None)
        .thumb_style(Style::default().fg(theme.roles().scrollbar_thumb))
        .track_style(Style::default().fg(theme.roles().scrollbar_track));
    frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
}
