//! Terminal UI: runtime loop, components, theme and layout helpers.

pub mod components;
pub mod debounce;
pub mod main_component;
pub mod runtime;
pub mod theme;
pub mod utils;
