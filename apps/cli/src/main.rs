//! Skimmer CLI — search and read progressively summarized results.
//!
//! Results appear as soon as the search answers; each one is summarized in
//! turn, a fixed interval apart, and filled in as its summary arrives.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
