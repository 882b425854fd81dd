//! Release notes from the GitHub releases API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::releases::{RepoLocation, VersionStep, releases_in_range, sibling_tag, split_repo_url, tag_matches};
use super::{ChangeLogEntry, ChangeLogResult, ChangelogError, ChangelogRequest, ChangelogSource};
use crate::datasource::{Credentials, authorized_get, check_response};
use crate::versioning;

pub const GITHUB_API: &str = "https://api.github.com";

/// Reads release notes from github.com or a GitHub Enterprise host.
pub struct GithubChangelogSource {
    client: Client,
    api_url: String,
    credentials: Option<Credentials>,
}

impl GithubChangelogSource {
    pub fn new(api_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// API root serving `repo`. Credentials are only sent to the configured API.
    fn api_for(&self, repo: &RepoLocation) -> (String, Option<&Credentials>) {
        let configured = self.api_url.contains(&repo.host)
            || (repo.host == "github.com" && self.api_url == GITHUB_API);
        if configured {
            (self.api_url.clone(), self.credentials.as_ref())
        } else {
            (format!("{}/api/v3", repo.base_url), None)
        }
    }

    async fn fetch_releases(
        &self,
        repo: &RepoLocation,
    ) -> Result<Option<Vec<GithubRelease>>, ChangelogError> {
        let (api, credentials) = self.api_for(repo);
        let url = format!("{}/repos/{}/releases?per_page=100", api, repo.path);
        debug!(url = %url, "fetching github releases");

        let response = authorized_get(&self.client, &url, credentials)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        match check_response(response)? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }
}

impl Default for GithubChangelogSource {
    fn default() -> Self {
        Self::new(GITHUB_API, None)
    }
}

// GitHub API response types
#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    body: Option<String>,
    #[serde(default)]
    draft: bool,
}

fn build_entries(
    repository_url: &str,
    steps: &[VersionStep],
    releases: &[GithubRelease],
) -> Vec<ChangeLogEntry> {
    steps
        .iter()
        .filter_map(|step| {
            let release = releases
                .iter()
                .find(|r| !r.draft && tag_matches(&r.tag_name, &step.version))?;
            let notes = release.body.as_deref().map(str::trim).filter(|b| !b.is_empty())?;
            let compare_url = step.previous.as_deref().map(|previous| {
                format!(
                    "{}/compare/{}...{}",
                    repository_url,
                    sibling_tag(&release.tag_name, &step.version, previous),
                    release.tag_name
                )
            });
            Some(ChangeLogEntry {
                version: step.version.clone(),
                notes_markdown: notes.to_string(),
                compare_url,
            })
        })
        .collect()
}

#[async_trait]
impl ChangelogSource for GithubChangelogSource {
    async fn fetch(&self, request: &ChangelogRequest) -> Result<Option<ChangeLogResult>, ChangelogError> {
        let repo = split_repo_url(&request.source_url)?;
        let scheme = versioning::get(&request.versioning);
        let steps = releases_in_range(
            &request.releases,
            scheme,
            &request.from_version,
            &request.to_version,
        );
        if steps.is_empty() {
            return Ok(None);
        }

        let Some(releases) = self.fetch_releases(&repo).await? else {
            debug!(repo = %repo.path, "github repository not found");
            return Ok(None);
        };

        let repository_url = repo.repository_url();
        let entries = build_entries(&repository_url, &steps, &releases);
        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(ChangeLogResult {
            repository_url,
            entries,
        }))
    }
}
