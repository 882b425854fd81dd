//! Release notes from the GitLab releases API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::form_urlencoded;

use super::releases::{RepoLocation, VersionStep, releases_in_range, sibling_tag, split_repo_url, tag_matches};
use super::{ChangeLogEntry, ChangeLogResult, ChangelogError, ChangelogRequest, ChangelogSource};
use crate::datasource::{Credentials, authorized_get, check_response};
use crate::versioning;

pub const GITLAB_API: &str = "https://gitlab.com/api/v4";

/// Reads release notes from gitlab.com or a self-hosted GitLab.
pub struct GitlabChangelogSource {
    client: Client,
    api_url: String,
    credentials: Option<Credentials>,
}

impl GitlabChangelogSource {
    pub fn new(api_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn api_for(&self, repo: &RepoLocation) -> (String, Option<&Credentials>) {
        if self.api_url.contains(&repo.host) {
            (self.api_url.clone(), self.credentials.as_ref())
        } else {
            (format!("{}/api/v4", repo.base_url), None)
        }
    }

    async fn fetch_releases(
        &self,
        repo: &RepoLocation,
    ) -> Result<Option<Vec<GitlabRelease>>, ChangelogError> {
        let (api, credentials) = self.api_for(repo);
        let url = format!(
            "{}/projects/{}/releases?per_page=100",
            api,
            encode_project(&repo.path)
        );
        debug!(url = %url, "fetching gitlab releases");

        let response = authorized_get(&self.client, &url, credentials).send().await?;
        match check_response(response)? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }
}

impl Default for GitlabChangelogSource {
    fn default() -> Self {
        Self::new(GITLAB_API, None)
    }
}

// GitLab API response types
#[derive(Debug, Deserialize)]
struct GitlabRelease {
    tag_name: String,
    description: Option<String>,
}

/// Projects are addressed by their url-encoded full path: `group%2Fproject`.
fn encode_project(path: &str) -> String {
    form_urlencoded::byte_serialize(path.as_bytes()).collect()
}

fn build_entries(
    repository_url: &str,
    steps: &[VersionStep],
    releases: &[GitlabRelease],
) -> Vec<ChangeLogEntry> {
    steps
        .iter()
        .filter_map(|step| {
            let release = releases
                .iter()
                .find(|r| tag_matches(&r.tag_name, &step.version))?;
            let notes = release
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())?;
            let compare_url = step.previous.as_deref().map(|previous| {
                format!(
                    "{}/-/compare/{}...{}",
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
impl ChangelogSource for GitlabChangelogSource {
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
            debug!(project = %repo.path, "gitlab project not found");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_project() {
        assert_eq!(encode_project("group/sub/project"), "group%2Fsub%2Fproject");
    }

    #[test]
    fn test_api_for_self_hosted() {
        let source = GitlabChangelogSource::new(GITLAB_API, Some(Credentials::bearer("t")));

        let hosted = split_repo_url("https://gitlab.com/g/p").unwrap();
        let (api, credentials) = source.api_for(&hosted);
        assert_eq!(api, GITLAB_API);
        assert!(credentials.is_some());

        let own = split_repo_url("https://git.example.com/g/p").unwrap();
        let (api, credentials) = source.api_for(&own);
        assert_eq!(api, "https://git.example.com/api/v4");
        assert!(credentials.is_none());
    }

    #[test]
    fn test_build_entries() {
        let releases: Vec<GitlabRelease> = serde_json::from_str(
            r#"[
                { "tag_name": "v1.2.0", "description": "- faster startup\n" },
                { "tag_name": "v1.1.0", "description": null }
            ]"#,
        )
        .unwrap();
        let steps = [
            VersionStep {
                previous: Some("1.0.0".to_string()),
                version: "1.1.0".to_string(),
            },
            VersionStep {
                previous: Some("1.1.0".to_string()),
                version: "1.2.0".to_string(),
            },
        ];
        let entries = build_entries("https://gitlab.com/g/p", &steps, &releases);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].notes_markdown, "- faster startup");
        assert_eq!(
            entries[0].compare_url.as_deref(),
            Some("https://gitlab.com/g/p/-/compare/v1.1.0...v1.2.0")
        );
    }

    // Hits the live API
    #[tokio::test]
    #[ignore]
    async fn test_fetch_live_release_notes() {
        let source = GitlabChangelogSource::default();
        let request = ChangelogRequest {
            source_url: "https://gitlab.com/gitlab-org/gitlab-runner".to_string(),
            versioning: "semver".to_string(),
            from_version: "16.0.0".to_string(),
            to_version: "16.0.1".to_string(),
            releases: vec![],
        };
        assert!(source.fetch(&request).await.is_ok());
    }
}
