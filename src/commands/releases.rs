//! Releases command - list the releases of a dependency.

use anyhow::{Context, Result};
use clap::Args;

use super::lookup::{LookupArgs, default_resolver};
use crate::config::RelnotesConfig;
use crate::datasource::ReleaseResult;

#[derive(Args)]
pub struct ReleasesCmd {
    #[command(flatten)]
    pub lookup: LookupArgs,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Show only the newest N releases
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl ReleasesCmd {
    pub async fn run(&self) -> Result<()> {
        let config = RelnotesConfig::load()?;
        let query = self.lookup.to_query(&config);
        let resolver = default_resolver();

        let Some(result) = resolver
            .resolve(&query)
            .await
            .with_context(|| format!("Failed to resolve {}", query.dep_name))?
        else {
            println!("No releases found for {}:{}", query.datasource, query.dep_name);
            return Ok(());
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        print_summary(&query.dep_name, &result, self.limit);
        Ok(())
    }
}

fn print_summary(name: &str, result: &ReleaseResult, limit: Option<usize>) {
    println!("{} ({} releases)", name, result.releases.len());
    if let Some(ref source_url) = result.source_url {
        println!("  source:     {}", source_url);
    }
    if let Some(ref homepage) = result.homepage {
        println!("  homepage:   {}", homepage);
    }
    if let Some(ref changelog_url) = result.changelog_url {
        println!("  changelog:  {}", changelog_url);
    }
    if let Some(ref message) = result.deprecation_message {
        println!("  deprecated: {}", message);
    }
    for (tag, version) in &result.tags {
        println!("  tag {}: {}", tag, version);
    }
    println!();

    let skip = limit.map_or(0, |n| result.releases.len().saturating_sub(n));
    for release in result.releases.iter().skip(skip) {
        let timestamp = release
            .release_timestamp
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let marker = if release.is_deprecated { " (deprecated)" } else { "" };
        println!("  {:<24} {}{}", release.version, timestamp, marker);
    }
}
