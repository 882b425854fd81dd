//! Config command - manage tokens, endpoints and host rules.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::changelog::{HostRule, ProviderId};
use crate::config::RelnotesConfig;

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub command: ConfigSubCmd,
}

#[derive(Subcommand)]
pub enum ConfigSubCmd {
    /// Set the GitHub API token
    SetGithubToken(SetTokenCmd),

    /// Set the GitLab API token
    SetGitlabToken(SetTokenCmd),

    /// Treat URLs on a host as GitHub or GitLab
    AddHostRule(AddHostRuleCmd),

    /// Show current configuration
    Show,
}

#[derive(Args)]
pub struct SetTokenCmd {
    /// API token
    pub token: String,
}

#[derive(Args)]
pub struct AddHostRuleCmd {
    /// Hostname (matches subdomains too) or URL prefix
    pub match_host: String,

    /// Host type
    #[arg(value_enum)]
    pub host_type: ProviderId,
}

fn token_state(token: &Option<String>) -> &'static str {
    if token.as_ref().is_some_and(|t| !t.is_empty()) {
        "(set)"
    } else {
        "(not set)"
    }
}

impl ConfigCmd {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            ConfigSubCmd::SetGithubToken(cmd) => {
                let mut config = RelnotesConfig::load()?;
                config.github_token = Some(cmd.token.clone());
                config.save()?;
                println!("GitHub token saved.");
            }
            ConfigSubCmd::SetGitlabToken(cmd) => {
                let mut config = RelnotesConfig::load()?;
                config.gitlab_token = Some(cmd.token.clone());
                config.save()?;
                println!("GitLab token saved.");
            }
            ConfigSubCmd::AddHostRule(cmd) => {
                let mut config = RelnotesConfig::load()?;
                config.add_host_rule(HostRule {
                    match_host: cmd.match_host.clone(),
                    host_type: cmd.host_type,
                });
                config.save()?;
                println!("{} is now treated as {}", cmd.match_host, cmd.host_type);
            }
            ConfigSubCmd::Show => {
                let config = RelnotesConfig::load()?;
                println!("Config: {}", RelnotesConfig::config_path()?.display());
                println!();
                println!("github_token:   {}", token_state(&config.github_token));
                println!("gitlab_token:   {}", token_state(&config.gitlab_token));
                println!("github_api_url: {}", config.github_api_url);
                println!("gitlab_api_url: {}", config.gitlab_api_url);
                for rule in &config.host_rules {
                    println!("host_rule:      {} -> {}", rule.match_host, rule.host_type);
                }
                for (datasource, urls) in &config.registry_urls {
                    println!("registry_urls:  {} = {}", datasource, urls.join(", "));
                }
            }
        }
        Ok(())
    }
}
