//! Theme styling for the TUI.
//!
//! Nord (default and high contrast) for truecolor terminals and an indexed
//! fallback otherwise. Components go through [`Theme`] and the helpers in
//! [`theme_helpers`] instead of hard-coding colors.

use std::env;

use tracing::debug;

pub mod ansi256;
pub mod nord;
pub mod roles;
pub mod theme_helpers;

pub use ansi256::Ansi256Theme;
pub use nord::{NordTheme, NordThemeHighContrast};
pub use roles::Theme;

/// Environment variable selecting the theme (`nord`, `nord-high-contrast`).
pub const THEME_ENV: &str = "QUEUEDECK_THEME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorCapability {
    Truecolor,
    Ansi256,
}

/// Selects a theme from the environment and terminal capabilities.
pub fn load_from_env() -> Box<dyn Theme> {
    let capability = detect_color_capability(
        env::var("COLORTERM").ok().as_deref(),
        env::var("TERM").ok().as_deref(),
    );
    select(capability, env::var(THEME_ENV).ok().as_deref())
}

fn select(capability: ColorCapability, requested: Option<&str>) -> Box<dyn Theme> {
    if capability == ColorCapability::Ansi256 {
        debug!("ANSI-only terminal detected; using indexed palette");
        return Box::new(Ansi256Theme::new());
    }
    match requested.map(|name| name.trim().to_ascii_lowercase()).as_deref() {
        Some("nord-high-contrast" | "high-contrast") => Box::new(NordThemeHighContrast::new()),
        _ => Box::new(NordTheme::new()),
    }
}

fn detect_color_capability(color_term: Option<&str>, term: Option<&str>) -> ColorCapability {
    let color_term = color_term.unwrap_or_default().to_ascii_lowercase();
    if color_term.contains("truecolor") || color_term.contains("24bit") {
        return ColorCapability::Truecolor;
    }
    if term.unwrap_or_default().to_ascii_lowercase().contains("truecolor") {
        return ColorCapability::Truecolor;
    }
    ColorCapability::Ansi256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truecolor_detection() {
        assert_eq!(detect_color_capability(Some("truecolor"), None), ColorCapability::Truecolor);
        assert_eq!(detect_color_capability(None, Some("xterm-truecolor")), ColorCapability::Truecolor);
        assert_eq!(detect_color_capability(None, Some("xterm-256color")), ColorCapability::Ansi256);
    }

    #[test]
    fn ansi_terminals_ignore_requested_theme() {
        let theme = select(ColorCapability::Ansi256, Some("nord-high-contrast"));
        assert_eq!(theme.roles().background, ratatui::style::Color::Indexed(236));
        let theme = select(ColorCapability::Truecolor, Some("nord-high-contrast"));
        assert_eq!(theme.roles().text, nord::S2);
    }
}
