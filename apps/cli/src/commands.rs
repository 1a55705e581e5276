//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use skimmer_core::{QueryController, SubmitOutcome};
use skimmer_providers::{backend_from_config, summarizer_from_config};
use skimmer_shared::{
    AppConfig, EnrichmentConfig, ResultSet, SUMMARY_FAILED_PLACEHOLDER, SummaryState, init_config,
    load_config, load_config_from,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Skimmer — search results that summarize themselves as you read.
#[derive(Parser)]
#[command(
    name = "skimmer",
    version,
    about = "Search, then watch each result fill in with an AI summary.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from this file instead of ~/.skimmer/skimmer.toml.
    #[arg(long, global = true, env = "SKIMMER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run a query and print its results once they are summarized.
    Search {
        /// Query text.
        query: String,

        /// Answer from a JSON fixture file instead of the search server.
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Summarize locally (leading sentences) instead of calling the API.
        #[arg(long)]
        offline: bool,

        /// Artificial delay before each offline summary, in milliseconds.
        #[arg(long, requires = "offline")]
        latency_ms: Option<u64>,

        /// Delay between successive summarization starts, in milliseconds.
        #[arg(long)]
        spacing_ms: Option<u64>,

        /// Stop waiting for summaries after this many seconds.
        #[arg(long, default_value = "120")]
        timeout_secs: u64,

        /// Print the final result set as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Options of the `search` subcommand.
struct SearchArgs {
    query: String,
    fixture: Option<PathBuf>,
    offline: Option<Duration>,
    spacing_ms: Option<u64>,
    timeout: Duration,
    json: bool,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "skimmer=warn",
        1 => "skimmer=info",
        2 => "skimmer=debug",
        _ => "skimmer=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays clean for results.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Search {
            query,
            fixture,
            offline,
            latency_ms,
            spacing_ms,
            timeout_secs,
            json,
        } => {
            let args = SearchArgs {
                query,
                fixture,
                offline: offline.then(|| Duration::from_millis(latency_ms.unwrap_or(0))),
                spacing_ms,
                timeout: Duration::from_secs(timeout_secs),
                json,
            };
            cmd_search(resolve_config(config_path.as_ref())?, args).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(resolve_config(config_path.as_ref())?),
        },
    }
}

fn resolve_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

async fn cmd_search(config: AppConfig, args: SearchArgs) -> Result<()> {
    let mut enrichment = EnrichmentConfig::from(&config);
    if let Some(ms) = args.spacing_ms {
        enrichment.spacing = Duration::from_millis(ms);
    }
    enrichment.validate()?;

    let backend = backend_from_config(&config, args.fixture.as_deref())?;
    let summarizer = summarizer_from_config(&config, args.offline)?;
    let mut controller = QueryController::new(backend, summarizer, enrichment);
    let store = controller.store();
    let mut updates = store.subscribe();

    let results = match controller.submit(&args.query).await {
        SubmitOutcome::Cleared { .. } => return Err(eyre!("query is empty")),
        SubmitOutcome::BackendFailed { error } => {
            return Err(eyre!("search backend unavailable: {error}"));
        }
        SubmitOutcome::Started { results, .. } => results,
    };

    info!(query = %args.query, results, "waiting for summaries");

    if results > 0 {
        let bar = ProgressBar::new(results as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> ")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.set_message("summarizing");

        let settle = async {
            loop {
                let settled = {
                    let snapshot = updates.borrow_and_update();
                    bar.set_position((snapshot.len() - snapshot.pending()) as u64);
                    snapshot.is_settled()
                };
                if settled || updates.changed().await.is_err() {
                    break;
                }
            }
        };

        if tokio::time::timeout(args.timeout, settle).await.is_err() {
            warn!(timeout_secs = args.timeout.as_secs(), "gave up waiting for summaries");
        }
        bar.finish_and_clear();
    }

    let snapshot = store.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_results(&snapshot);
    }

    Ok(())
}

fn print_results(results: &ResultSet) {
    println!();
    if results.is_empty() {
        println!("  No results for \"{}\".", results.query);
        println!();
        return;
    }

    match results.search_time_ms {
        Some(ms) => println!(
            "  {} results for \"{}\" ({ms} ms)",
            results.len(),
            results.query
        ),
        None => println!("  {} results for \"{}\"", results.len(), results.query),
    }
    println!();

    for (i, record) in results.records.iter().enumerate() {
        println!("  {}. {}", i + 1, record.url());
        let body = match record.state {
            SummaryState::Pending => "(summary still loading)",
            SummaryState::Ready => record.summary.as_deref().unwrap_or_default(),
            SummaryState::Failed => record
                .summary
                .as_deref()
                .unwrap_or(SUMMARY_FAILED_PLACEHOLDER),
        };
        for line in wrap(body, 76) {
            println!("     {line}");
        }
        println!();
    }

    let failed = results.count(SummaryState::Failed);
    let pending = results.pending();
    if failed > 0 || pending > 0 {
        println!("  {failed} failed, {pending} still pending");
        println!();
    }
}

/// Greedy word wrap at `width` columns.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from([
            "skimmer",
            "search",
            "rust async",
            "--offline",
            "--latency-ms",
            "400",
            "--spacing-ms",
            "250",
        ])
        .unwrap();
        match cli.command {
            Command::Search {
                query,
                offline,
                latency_ms,
                spacing_ms,
                timeout_secs,
                ..
            } => {
                assert_eq!(query, "rust async");
                assert!(offline);
                assert_eq!(latency_ms, Some(400));
                assert_eq!(spacing_ms, Some(250));
                assert_eq!(timeout_secs, 120);
            }
            Command::Config { .. } => panic!("expected search"),
        }
    }

    #[test]
    fn latency_requires_offline() {
        let parsed = Cli::try_parse_from(["skimmer", "search", "cats", "--latency-ms", "400"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn wrap_keeps_long_words_whole() {
        let lines = wrap("supercalifragilistic ok", 5);
        assert_eq!(lines, vec!["supercalifragilistic", "ok"]);
    }
}
