//! On-disk configuration for the queuedeck dashboard.
//!
//! A small JSON file holds list tuning knobs and the API base URL. The file
//! lives in the standard configuration directory
//! (`~/.config/queuedeck/config.json` on most platforms); a missing file means
//! defaults, a malformed one is reported and ignored.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::{config_dir, home_dir};
use queuedeck_types::{FilterState, StatusFilter};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "QUEUEDECK_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "queuedeck";

/// Error surfaced when the config file cannot be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure other than a missing file (for example, permissions).
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tuning knobs for the list view plus connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Base URL of the queue API; `None` defers to the environment.
    pub api_base: Option<String>,
    /// Rows requested per page.
    pub page_size: usize,
    /// Distance in rows from the loaded tail at which the next page is requested.
    pub prefetch_threshold: usize,
    /// Extra rows rendered on each side of the viewport.
    pub overscan: usize,
    /// Quiet period before pending filter edits are committed.
    pub debounce_ms: u64,
    /// Height assumed for rows that have not been measured yet.
    pub estimated_row_height: u16,
    /// Status filter applied when no query string is supplied.
    pub default_status: StatusFilter,
    /// Whether the manual-review-only switch starts enabled.
    pub default_review_only: bool,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            page_size: 50,
            prefetch_threshold: 10,
            overscan: 3,
            debounce_ms: 300,
            estimated_row_height: 1,
            default_status: StatusFilter::All,
            default_review_only: false,
        }
    }
}

impl DeckConfig {
    /// Loads the config from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    /// Loads the config from `path`, falling back to defaults when the file
    /// is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<DeckConfig>(&data) {
                Ok(config) => config,
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "Failed to parse config file; using defaults"
                    );
                    DeckConfig::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => DeckConfig::default(),
            Err(error) => return Err(ConfigError::Io(error)),
        };
        Ok(config.sanitized())
    }

    /// The filter used when the view is opened without a query string.
    pub fn default_filter(&self) -> FilterState {
        FilterState::new(self.default_status, self.default_review_only)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Clamps values that would stall pagination or rendering.
    pub fn sanitized(mut self) -> Self {
        if self.page_size == 0 {
            warn!("page_size of 0 is not usable; falling back to 50");
            self.page_size = 50;
        }
        self.estimated_row_height = self.estimated_row_height.max(1);
        self
    }
}

/// Resolves the config path from `QUEUEDECK_CONFIG_PATH` or the platform
/// config directory.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }
    app_config_dir().join(CONFIG_FILE_NAME)
}

/// `<config dir>/queuedeck`, or `./queuedeck` when no config dir exists.
pub fn app_config_dir() -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR_NAME)
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}
