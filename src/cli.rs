//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{
    ChangelogCmd, ConfigCmd, DatasourcesCmd, DigestCmd, ReleasesCmd, SourceUrlCmd,
};

#[derive(Parser)]
#[command(name = "relnotes")]
#[command(about = "relnotes - dependency releases and release notes across registries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the releases of a dependency
    Releases(ReleasesCmd),

    /// Print the digest of a dependency version
    Digest(DigestCmd),

    /// Show release notes between two versions
    Changelog(ChangelogCmd),

    /// Normalize a repository URL
    SourceUrl(SourceUrlCmd),

    /// List supported datasources and version schemes
    Datasources(DatasourcesCmd),

    /// Manage configuration (tokens, host rules)
    Config(ConfigCmd),
}

impl Command {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Command::Releases(cmd) => cmd.run().await,
            Command::Digest(cmd) => cmd.run().await,
            Command::Changelog(cmd) => cmd.run().await,
            Command::SourceUrl(cmd) => cmd.run().await,
            Command::Datasources(cmd) => cmd.run().await,
            Command::Config(cmd) => cmd.run().await,
        }
    }
}
