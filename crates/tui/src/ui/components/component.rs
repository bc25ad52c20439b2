//! Component trait shared by the views.
//!
//! Components own local UI behavior, receive input and messages, and report
//! side effects back as [`Effect`]s instead of performing them.

use crossterm::event::{KeyEvent, MouseEvent};
use queuedeck_types::{Effect, Msg};
use ratatui::{Frame, layout::Rect, text::Span};

use crate::app::App;

pub(crate) trait Component {
    /// Handle a message routed to this component.
    fn handle_message(&mut self, _app: &mut App, _msg: Msg) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle key events when this component has focus.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    fn handle_mouse_events(&mut self, _app: &mut App, _mouse: MouseEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Render into `rect`. State changes needed for layout (viewport height,
    /// measured row heights) are allowed here; everything else belongs in the
    /// handlers.
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);

    /// Key hints for the hint bar.
    fn get_hint_spans(&self, _app: &App) -> Vec<Span<'_>> {
        Vec::new()
    }
}
