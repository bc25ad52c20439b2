//! Command-line arguments and how they layer over the config file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use queuedeck_types::{FilterState, StatusFilter};
use queuedeck_util::DeckConfig;

/// Browse a job queue from the terminal.
///
/// Without a subcommand the interactive list opens. On exit the query string
/// of the last applied filter is printed; pass it back with `--query` to
/// reopen the same view.
#[derive(Parser, Debug)]
#[command(name = "queuedeck", version, about)]
pub struct Args {
    /// Base URL of the queue API
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Rows requested per page
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Rows from the end of the loaded list at which the next page is requested
    #[arg(long)]
    pub prefetch_threshold: Option<usize>,

    /// Extra rows rendered above and below the viewport
    #[arg(long)]
    pub overscan: Option<usize>,

    /// Quiet period in milliseconds before filter edits are applied
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Status filter used when no query string is given
    #[arg(long)]
    pub default_status: Option<StatusFilter>,

    /// Start with the manual-review-only switch on
    #[arg(long)]
    pub review_only: bool,

    /// Query string to restore, e.g. `status=pending&review=true`
    #[arg(long)]
    pub query: Option<String>,

    /// Log file for the interactive view
    #[arg(long, env = "QUEUEDECK_LOG_PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print one page of jobs as JSON
    Jobs {
        /// Only jobs with this status (`all`, `pending`, `processing`, `completed`)
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Only jobs flagged for manual review
        #[arg(long)]
        review: bool,
        /// Page size; defaults to the configured page size
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Print the dashboard counts as JSON
    Dashboard,
}

impl Args {
    /// Layers flags over `config`; flags win.
    pub fn apply_to(&self, mut config: DeckConfig) -> DeckConfig {
        if let Some(api_base) = self.api_base.as_ref() {
            config.api_base = Some(api_base.clone());
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(threshold) = self.prefetch_threshold {
            config.prefetch_threshold = threshold;
        }
        if let Some(overscan) = self.overscan {
            config.overscan = overscan;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = debounce_ms;
        }
        if let Some(status) = self.default_status {
            config.default_status = status;
        }
        if self.review_only {
            config.default_review_only = true;
        }
        config.sanitized()
    }
}

impl Command {
    /// Filter for the `jobs` subcommand.
    pub fn jobs_filter(&self) -> Option<FilterState> {
        match self {
            Self::Jobs { status, review, .. } => Some(FilterState::new(*status, *review)),
            Self::Dashboard => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuedeck_types::JobStatus;

    #[test]
    fn flags_override_config_values() {
        let args = Args::try_parse_from([
            "queuedeck",
            "--page-size",
            "25",
            "--default-status",
            "pending",
            "--review-only",
        ])
        .expect("args");
        let file = DeckConfig {
            page_size: 80,
            overscan: 7,
            ..DeckConfig::default()
        };
        let config = args.apply_to(file);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.overscan, 7);
        assert_eq!(
            config.default_filter(),
            FilterState::new(StatusFilter::Only(JobStatus::Pending), true)
        );
    }

    #[test]
    fn zero_page_size_is_sanitized() {
        let args = Args::try_parse_from(["queuedeck", "--page-size", "0"]).expect("args");
        assert_eq!(args.apply_to(DeckConfig::default()).page_size, 50);
    }

    #[test]
    fn jobs_subcommand_parses_filter() {
        let args = Args::try_parse_from(["queuedeck", "jobs", "--status", "completed", "--review", "--limit", "5"])
            .expect("args");
        let command = args.command.expect("subcommand");
        assert_eq!(
            command.jobs_filter(),
            Some(FilterState::new(StatusFilter::Only(JobStatus::Completed), true))
        );
        assert!(matches!(command, Command::Jobs { limit: Some(5), offset: 0, .. }));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Args::try_parse_from(["queuedeck", "jobs", "--status", "stuck"]).is_err());
    }
}
