//! Changelog command - release notes between two versions of a dependency.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use super::lookup::{LookupArgs, default_resolver};
use crate::changelog::{
    ChangeLogQuery, ChangelogService, GithubChangelogSource, GitlabChangelogSource, ProviderId,
    UpgradeLinks, UpgradeMetadata, compose,
};
use crate::config::RelnotesConfig;
use crate::versioning;

#[derive(Args)]
pub struct ChangelogCmd {
    #[command(flatten)]
    pub lookup: LookupArgs,

    /// Version currently in use
    #[arg(long)]
    pub from: String,

    /// Version being upgraded to
    #[arg(long)]
    pub to: String,

    /// Force the code host type instead of guessing from the URL
    #[arg(long, value_enum)]
    pub host_type: Option<ProviderId>,

    /// Package directory inside a monorepo
    #[arg(long)]
    pub source_directory: Option<String>,
}

impl ChangelogCmd {
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

        let links = UpgradeLinks::build(&UpgradeMetadata {
            dep_name: &query.dep_name,
            homepage: result.homepage.as_deref(),
            source_url: result.source_url.as_deref(),
            source_directory: self.source_directory.as_deref(),
            changelog_url: result.changelog_url.as_deref(),
        });
        println!("{}: {} -> {}", links.dep_name_linked, self.from, self.to);
        if !links.references.is_empty() {
            println!("References: {}", links.references);
        }

        let service = ChangelogService::new(
            Arc::new(GithubChangelogSource::new(
                config.github_api_url.clone(),
                config.github_credentials(),
            )),
            Arc::new(GitlabChangelogSource::new(
                config.gitlab_api_url.clone(),
                config.gitlab_credentials(),
            )),
            Arc::new(config.host_rules()),
        );

        let changelog_query = ChangeLogQuery {
            dep_name: query.dep_name.clone(),
            source_url: result.source_url.clone(),
            homepage: result.homepage.clone(),
            versioning: query.versioning().to_string(),
            from_version: Some(self.from.clone()),
            to_version: self.to.clone(),
            releases: result.releases.clone(),
            platform_host_type: self.host_type,
        };

        match service.get_changelog(&changelog_query).await {
            Some(changelog) => {
                let scheme = versioning::get(query.versioning());
                println!("\nRelease notes from {}", changelog.repository_url);
                println!("{}", compose(&changelog, scheme));
            }
            None => println!("\nNo release notes found."),
        }
        Ok(())
    }
}
