//! Source URL command - print the canonical form of a repository URL.

use anyhow::Result;
use clap::Args;

use crate::datasource::source_url;

#[derive(Args)]
pub struct SourceUrlCmd {
    /// Repository reference (URL, scp-style, or host/path)
    pub url: String,
}

impl SourceUrlCmd {
    pub async fn run(&self) -> Result<()> {
        match source_url::normalize(Some(&self.url)) {
            Some(normalized) => println!("{}", normalized),
            None => anyhow::bail!("Not a usable repository URL: {}", self.url),
        }
        Ok(())
    }
}
