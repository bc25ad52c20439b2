mod args;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use args::{Args, Command};
use clap::Parser;
use queuedeck_api::{QueueClient, QueueSource};
use queuedeck_util::{DeckConfig, app_config_dir, decode_filter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "queuedeck.log";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The interactive view owns the terminal, so its logs go to a file.
    match args.command {
        Some(_) => init_stderr_tracing(),
        None => init_file_tracing(args.log_file.as_deref())?,
    }

    let file_config = DeckConfig::load().unwrap_or_else(|error| {
        warn!(%error, "could not read config; using defaults");
        DeckConfig::default()
    });
    let config = args.apply_to(file_config);
    let client = QueueClient::new_from_env(config.api_base.as_deref()).context("configure API client")?;

    match args.command.as_ref() {
        Some(command) => run_command(&client, &config, command).await,
        None => {
            let initial = match args.query.as_deref() {
                Some(query) => decode_filter(query).with_context(|| format!("invalid --query '{query}'"))?,
                None => config.default_filter(),
            };
            info!(base_url = %client.base_url, page_size = config.page_size, "opening queue view");
            let source: Arc<dyn QueueSource> = Arc::new(client);
            let query = queuedeck_tui::run(config, source, initial).await?;
            if !query.is_empty() {
                println!("{query}");
            }
            Ok(())
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_file_tracing(path: Option<&Path>) -> Result<()> {
    let path = path.map(PathBuf::from).unwrap_or_else(|| app_config_dir().join(LOG_FILE_NAME));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

async fn run_command(client: &QueueClient, config: &DeckConfig, command: &Command) -> Result<()> {
    let output = match command {
        Command::Jobs { limit, offset, .. } => {
            let filter = command.jobs_filter().unwrap_or_default();
            let limit = limit.unwrap_or(config.page_size);
            let page = client
                .list_jobs(&filter, *offset, limit)
                .await
                .context("list jobs")?;
            if page.is_short_with_more() {
                warn!(received = page.items.len(), limit, "short page still claims more rows");
            }
            serde_json::json!({
                "items": page.items,
                "offset": page.offset,
                "limit": page.limit,
                "has_more": page.has_more,
            })
        }
        Command::Dashboard => serde_json::to_value(client.dashboard().await.context("fetch dashboard")?)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
