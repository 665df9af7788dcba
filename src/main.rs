use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triage::console::{default_jobs, Console, Settings, State};
use triage::editor::ExternalEditor;
use triage::launcher::SystemSpawner;
use triage::pagerduty::PagerDutyClient;
use triage::Config;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    env!("TRIAGE_VERSION_SUFFIX")
);

#[derive(Parser)]
#[command(name = "triage")]
#[command(author, version = VERSION, about = "Triage - terminal console for on-call incidents", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (default: the platform config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Where the log file lives; the terminal belongs to the UI
fn log_file_path() -> Result<PathBuf> {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "triage") {
        return Ok(proj_dirs.cache_dir().join("triage.log"));
    }
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(".triage").join("triage.log"))
}

fn init_logging(verbose: bool) -> Result<PathBuf> {
    let path = log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = if verbose { "triage=debug" } else { "triage=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(cli.verbose)?;
    tracing::info!(
        "triage {} ({}) logging to {}",
        VERSION,
        env!("TRIAGE_GIT_HASH"),
        log_path.display()
    );

    let config = Config::load(cli.config.as_deref())?;
    config.validate().context("Invalid configuration")?;

    let client = PagerDutyClient::new(config.api_url()?, config.token.clone());
    let settings = Settings::from_config(&config);
    if settings.browser.is_none() {
        tracing::warn!("No browser opener for this platform, opening incidents is disabled");
    }

    let console = Console::new(
        State::new(settings),
        Arc::new(client),
        Arc::new(SystemSpawner),
        Arc::new(ExternalEditor::new(config.editor_command())),
    );
    let jobs = default_jobs(Duration::from_secs(config.poll_interval_secs.max(1)));

    triage::tui::run(console, jobs).await
}
