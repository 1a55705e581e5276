//! Skimmer TUI — type a query, watch the result cards fill in.
//!
//! The terminal loop runs on the main thread and only reads the shared
//! result store; a background task owns the query controller and receives
//! submitted queries over a channel.

mod app;
mod widgets;

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;
use skimmer_core::{QueryController, SubmitOutcome};
use skimmer_providers::{backend_from_config, summarizer_from_config};
use skimmer_shared::{AppConfig, EnrichmentConfig, config_dir, load_config, load_config_from};
use tokio::sync::mpsc;
use tracing::info;

/// Interactive search with progressively summarized results.
#[derive(Parser)]
#[command(name = "skimmer-tui", version, long_about = None)]
struct Args {
    /// Answer from a JSON fixture file instead of the search server.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Summarize locally (leading sentences) instead of calling the API.
    #[arg(long)]
    offline: bool,

    /// Artificial delay before each offline summary, in milliseconds.
    #[arg(long, requires = "offline")]
    latency_ms: Option<u64>,

    /// Read configuration from this file instead of ~/.skimmer/skimmer.toml.
    #[arg(long, env = "SKIMMER_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing()?;

    let config: AppConfig = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let enrichment = EnrichmentConfig::from(&config);
    enrichment.validate()?;

    let backend = backend_from_config(&config, args.fixture.as_deref())?;
    let offline = args
        .offline
        .then(|| Duration::from_millis(args.latency_ms.unwrap_or(0)));
    let summarizer = summarizer_from_config(&config, offline)?;
    let controller = QueryController::new(backend, summarizer, enrichment);
    let store = controller.store();

    let runtime = tokio::runtime::Runtime::new()?;
    let (query_tx, query_rx) = mpsc::unbounded_channel();
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    runtime.spawn(drive_queries(controller, query_rx, outcome_tx));

    info!("starting TUI");
    let result = app::run(store, query_tx, outcome_rx);

    // Pending summaries are abandoned on exit.
    runtime.shutdown_background();
    result
}

/// Submit queries in arrival order, skipping any superseded while the previous search ran.
async fn drive_queries(
    mut controller: QueryController,
    mut queries: mpsc::UnboundedReceiver<String>,
    outcomes: mpsc::UnboundedSender<SubmitOutcome>,
) {
    while let Some(mut query) = queries.recv().await {
        while let Ok(newer) = queries.try_recv() {
            query = newer;
        }
        let outcome = controller.submit(&query).await;
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}

/// Log to `~/.skimmer/skimmer-tui.log`; the terminal belongs to the UI.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("skimmer-tui.log"))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skimmer=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}
