//! relnotes - resolve dependency releases and assemble their release notes.

mod changelog;
mod cli;
mod commands;
mod config;
mod datasource;
mod redact;
mod versioning;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is controlled by RUST_LOG and goes to stderr, leaving stdout for output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
