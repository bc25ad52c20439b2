//! ANSI 256-color fallback for terminals without truecolor support.
//!
//! Approximates the Nord palette with indexed colors so the list stays
//! legible in 8-bit terminals.

use ratatui::style::Color;

use super::roles::{Theme, ThemeRoles};

#[derive(Debug, Clone)]
pub struct Ansi256Theme {
    roles: ThemeRoles,
}

impl Ansi256Theme {
    pub fn new() -> Self {
        Self {
            roles: ThemeRoles {
                background: Color::Indexed(236),
                surface: Color::Indexed(237),
                surface_muted: Color::Indexed(239),
                border: Color::Indexed(240),

                text: Color::Indexed(253),
                text_secondary: Color::Indexed(255),
                text_muted: Color::Indexed(245),

                accent_primary: Color::Indexed(110),

                info: Color::Indexed(110),
                success: Color::Indexed(108),
                warning: Color::Indexed(222),
                error: Color::Indexed(167),

                selection_bg: Color::Indexed(240),
                selection_fg: Color::Indexed(255),
                focus: Color::Indexed(110),
                modal_bg: Color::Indexed(234),

                scrollbar_track: Color::Indexed(239),
                scrollbar_thumb: Color::Indexed(67),
            },
        }
    }
}

impl Default for Ansi256Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme for Ansi256Theme {
    fn roles(&self) -> &ThemeRoles {
        &self.roles
    }
}
