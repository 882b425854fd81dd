//! GitHub tags datasource: every tag of a repository is a release.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::{
    Credentials, Datasource, DigestQuery, Release, ReleaseQuery, ReleaseResult, check_response, get,
};
use super::error::DatasourceError;
use crate::redact::redact_credentials;

pub const ID: &str = "github-tags";

const GITHUB_API: &str = "https://api.github.com";

/// GitHub tags datasource. Lookup names are `owner/repo`.
pub struct GithubTagsDatasource {
    client: Client,
}

impl GithubTagsDatasource {
    pub fn new() -> Self {
        // the GitHub API rejects requests without a user agent
        let client = Client::builder()
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Option<T>, DatasourceError> {
        debug!(url = %redact_credentials(url), "fetching from github");
        let response = get(&self.client, url, credentials)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        match check_response(response)? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    async fn fetch_tags(
        &self,
        api: &str,
        repo: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Option<Vec<GithubTag>>, DatasourceError> {
        let url = format!("{}/repos/{}/tags?per_page=100", api, repo);
        self.fetch_json(&url, credentials).await
    }
}

impl Default for GithubTagsDatasource {
    fn default() -> Self {
        Self::new()
    }
}

// GitHub API response types
#[derive(Debug, Deserialize)]
struct GithubTag {
    name: String,
    commit: GithubCommitRef,
}

#[derive(Debug, Deserialize)]
struct GithubCommitRef {
    sha: String,
}

fn validate_repo(name: &str) -> Result<&str, DatasourceError> {
    let repo = name.trim_matches('/');
    match repo.split_once('/') {
        Some((owner, project)) if !owner.is_empty() && !project.is_empty() && !project.contains('/') => {
            Ok(repo)
        }
        _ => Err(DatasourceError::InvalidPackage(format!(
            "GitHub repositories must be owner/repo, got: {}",
            name
        ))),
    }
}

fn api_url(registry_urls: &[String]) -> &str {
    registry_urls
        .first()
        .map(|url| url.trim_end_matches('/'))
        .unwrap_or(GITHUB_API)
}

#[async_trait]
impl Datasource for GithubTagsDatasource {
    async fn fetch_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<ReleaseResult>, DatasourceError> {
        let repo = validate_repo(query.lookup_name())?;
        let api = api_url(&query.registry_urls);

        let Some(tags) = self.fetch_tags(api, repo, query.credentials.as_ref()).await? else {
            return Ok(None);
        };

        Ok(Some(ReleaseResult {
            source_url: Some(format!("https://github.com/{}", repo)),
            releases: tags.into_iter().map(|tag| Release::new(tag.name)).collect(),
            ..Default::default()
        }))
    }

    fn supports_digests(&self) -> bool {
        true
    }

    /// Commit SHA of the tag named `value`, or of the default branch head.
    async fn fetch_digest(&self, query: &DigestQuery) -> Result<Option<String>, DatasourceError> {
        let repo = validate_repo(&query.lookup_name)?;
        let api = api_url(&query.registry_urls);
        let credentials = query.credentials.as_ref();

        match query.value.as_deref() {
            Some(tag) => {
                let tags = self.fetch_tags(api, repo, credentials).await?;
                Ok(tags
                    .unwrap_or_default()
                    .into_iter()
                    .find(|t| t.name == tag)
                    .map(|t| t.commit.sha))
            }
            None => {
                let url = format!("{}/repos/{}/commits?per_page=1", api, repo);
                let commits: Option<Vec<GithubCommitRef>> = self.fetch_json(&url, credentials).await?;
                Ok(commits.and_then(|c| c.into_iter().next()).map(|c| c.sha))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_repo() {
        assert_eq!(validate_repo("renovatebot/renovate").unwrap(), "renovatebot/renovate");
        assert_eq!(validate_repo("/owner/repo/").unwrap(), "owner/repo");
        assert!(validate_repo("renovate").is_err());
        assert!(validate_repo("a/b/c").is_err());
    }

    #[test]
    fn test_api_url() {
        assert_eq!(api_url(&[]), "https://api.github.com");
        assert_eq!(
            api_url(&["https://ghe.example.com/api/v3/".to_string()]),
            "https://ghe.example.com/api/v3"
        );
    }

    #[test]
    fn test_supports_digests() {
        assert!(GithubTagsDatasource::new().supports_digests());
    }

    #[test]
    fn test_tag_parsing() {
        let tags: Vec<GithubTag> = serde_json::from_str(
            r#"[{"name": "v1.0.0", "commit": {"sha": "abc", "url": "https://x"}, "zipball_url": "z"}]"#,
        )
        .unwrap();
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[0].commit.sha, "abc");
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_tags() {
        let ds = GithubTagsDatasource::new();
        let result = ds
            .fetch_releases(&ReleaseQuery::new(ID, "serde-rs/serde"))
            .await
            .unwrap()
            .unwrap();
        assert!(!result.releases.is_empty());
    }
}
