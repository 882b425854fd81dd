//! Release notes for a version range of a dependency.
//!
//! A [`ChangelogService`] decides which host provider (GitHub-style or
//! GitLab-style) to ask, based on host rules and the dependency's source URL,
//! and absorbs every provider failure: changelogs are best effort and never
//! fail the surrounding workflow.

#![allow(dead_code)]

mod compose;
mod error;
mod github;
mod gitlab;
mod host_rules;
mod links;
mod releases;

pub use compose::compose;
pub use error::ChangelogError;
pub use github::GithubChangelogSource;
pub use gitlab::GitlabChangelogSource;
pub use host_rules::{HostRule, HostRules, HostTypeResolver};
pub use links::{UpgradeLinks, UpgradeMetadata};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::datasource::Release;
use crate::versioning::{self, DEFAULT_SCHEME};

/// Release notes providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[value(name = "github")]
    GitHub,
    #[value(name = "gitlab")]
    GitLab,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::GitHub => "github",
            ProviderId::GitLab => "gitlab",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(ProviderId::GitHub),
            "gitlab" => Ok(ProviderId::GitLab),
            _ => Err(format!("unknown host type: {}", s)),
        }
    }
}

/// What to fetch release notes for.
#[derive(Debug, Clone)]
pub struct ChangeLogQuery {
    pub dep_name: String,
    pub source_url: Option<String>,
    pub homepage: Option<String>,
    /// Version scheme id.
    pub versioning: String,
    pub from_version: Option<String>,
    pub to_version: String,
    /// Known releases of the dependency, ascending.
    pub releases: Vec<Release>,
    /// Explicit provider, bypassing URL inspection.
    pub platform_host_type: Option<ProviderId>,
}

impl Default for ChangeLogQuery {
    fn default() -> Self {
        Self {
            dep_name: String::new(),
            source_url: None,
            homepage: None,
            versioning: DEFAULT_SCHEME.to_string(),
            from_version: None,
            to_version: String::new(),
            releases: Vec::new(),
            platform_host_type: None,
        }
    }
}

/// Notes for one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub version: String,
    pub notes_markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_url: Option<String>,
}

/// Notes for every version in the requested range that has any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogResult {
    pub repository_url: String,
    pub entries: Vec<ChangeLogEntry>,
}

/// Input handed to a provider.
#[derive(Debug, Clone)]
pub struct ChangelogRequest {
    pub source_url: String,
    pub versioning: String,
    pub from_version: String,
    pub to_version: String,
    pub releases: Vec<Release>,
}

/// A host-specific source of release notes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangelogSource: Send + Sync {
    /// Notes for releases after `from_version` up to and including
    /// `to_version`. `Ok(None)` when the host has nothing.
    async fn fetch(&self, request: &ChangelogRequest) -> Result<Option<ChangeLogResult>, ChangelogError>;
}

/// The URL to look up notes for, or `None` when there is nothing to compare:
/// no source URL or homepage, no `from_version`, or `from` equal to `to`
/// under the query's version scheme.
fn changelog_url(query: &ChangeLogQuery) -> Option<&str> {
    let url = query.source_url.as_deref().or(query.homepage.as_deref())?;
    let from_version = query.from_version.as_deref()?;
    let scheme = versioning::get(&query.versioning);
    if scheme.equals(from_version, &query.to_version) {
        return None;
    }
    Some(url)
}

/// Providers to try, in order. Empty means "no changelog".
///
/// When the URL looks like both hosts, GitHub is tried first and GitLab is the
/// fallback.
pub fn select_providers(query: &ChangeLogQuery, rules: &dyn HostTypeResolver) -> Vec<ProviderId> {
    let Some(url) = changelog_url(query) else {
        return vec![];
    };

    if let Some(host_type) = query
        .platform_host_type
        .or_else(|| rules.resolve_host_type(url))
    {
        return vec![host_type];
    }

    let lower = url.to_ascii_lowercase();
    let mut chain = Vec::with_capacity(2);
    if lower.contains("github") {
        chain.push(ProviderId::GitHub);
    }
    if lower.contains("gitlab") {
        chain.push(ProviderId::GitLab);
    }
    chain
}

/// First provider to ask, if any.
pub fn select_provider(query: &ChangeLogQuery, rules: &dyn HostTypeResolver) -> Option<ProviderId> {
    select_providers(query, rules).into_iter().next()
}

/// Provider lookup plus host rules.
pub struct ChangelogService {
    github: Arc<dyn ChangelogSource>,
    gitlab: Arc<dyn ChangelogSource>,
    host_rules: Arc<dyn HostTypeResolver>,
}

impl ChangelogService {
    pub fn new(
        github: Arc<dyn ChangelogSource>,
        gitlab: Arc<dyn ChangelogSource>,
        host_rules: Arc<dyn HostTypeResolver>,
    ) -> Self {
        Self {
            github,
            gitlab,
            host_rules,
        }
    }

    fn provider(&self, id: ProviderId) -> &dyn ChangelogSource {
        match id {
            ProviderId::GitHub => self.github.as_ref(),
            ProviderId::GitLab => self.gitlab.as_ref(),
        }
    }

    /// Release notes for the query, or `None`. Never fails.
    pub async fn get_changelog(&self, query: &ChangeLogQuery) -> Option<ChangeLogResult> {
        let chain = select_providers(query, self.host_rules.as_ref());
        if chain.is_empty() {
            match changelog_url(query) {
                Some(url) => warn!(dep = %query.dep_name, url = %url, "no changelog provider for host"),
                None => debug!(dep = %query.dep_name, "no changelog source applies"),
            }
            return None;
        }

        let request = ChangelogRequest {
            source_url: query
                .source_url
                .clone()
                .or_else(|| query.homepage.clone())
                .unwrap_or_default(),
            versioning: query.versioning.clone(),
            from_version: query.from_version.clone().unwrap_or_default(),
            to_version: query.to_version.clone(),
            releases: query.releases.clone(),
        };

        for id in chain {
            match self.provider(id).fetch(&request).await {
                Ok(Some(result)) => return Some(result),
                Ok(None) => debug!(dep = %query.dep_name, provider = %id, "no release notes"),
                Err(err) => {
                    error!(dep = %query.dep_name, provider = %id, error = %err, "changelog lookup failed");
                    return None;
                }
            }
        }
        None
    }
}
