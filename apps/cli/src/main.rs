//! hotdogjobs CLI: runs the hot-dog job pipeline and its query server.
//!
//! Generates jobs on a timer, enriches them through a chain of stages, and
//! serves the finished jobs over HTTP.

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
