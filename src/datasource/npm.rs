//! npm registry datasource.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::{Datasource, Release, ReleaseQuery, ReleaseResult, check_response, get};
use super::error::DatasourceError;
use crate::redact::redact_credentials;

pub const ID: &str = "npm";

const NPM_REGISTRY: &str = "https://registry.npmjs.org";

/// npm registry datasource.
pub struct NpmDatasource {
    client: Client,
}

impl NpmDatasource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for NpmDatasource {
    fn default() -> Self {
        Self::new()
    }
}

// npm registry response types
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    homepage: Option<String>,
    repository: Option<Repository>,
    #[serde(rename = "dist-tags", default)]
    dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, NpmVersionInfo>,
    #[serde(default)]
    time: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Repository {
    Simple(String),
    Detailed { url: Option<String> },
}

impl Repository {
    fn url(&self) -> Option<&str> {
        match self {
            Repository::Simple(url) => Some(url),
            Repository::Detailed { url } => url.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NpmVersionInfo {
    deprecated: Option<serde_json::Value>,
    repository: Option<Repository>,
}

/// Scoped packages need their slash escaped: `@types/node` -> `@types%2Fnode`.
fn escape_package_name(name: &str) -> String {
    name.replace('/', "%2F")
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn is_deprecated(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
        Some(serde_json::Value::String(message)) => !message.is_empty(),
        Some(_) => true,
    }
}

fn into_release_result(pkg: NpmPackageResponse) -> ReleaseResult {
    let latest_repository = pkg
        .dist_tags
        .get("latest")
        .and_then(|latest| pkg.versions.get(latest))
        .and_then(|info| info.repository.as_ref())
        .and_then(Repository::url)
        .map(str::to_string);

    let source_url = pkg
        .repository
        .as_ref()
        .and_then(Repository::url)
        .map(str::to_string)
        .or(latest_repository);

    let releases = pkg
        .versions
        .iter()
        .map(|(version, info)| Release {
            version: version.clone(),
            release_timestamp: pkg.time.get(version).and_then(|t| parse_timestamp(t)),
            is_deprecated: is_deprecated(info.deprecated.as_ref()),
            ..Default::default()
        })
        .collect();

    ReleaseResult {
        source_url,
        homepage: pkg.homepage,
        releases,
        tags: pkg.dist_tags,
        ..Default::default()
    }
}

#[async_trait]
impl Datasource for NpmDatasource {
    async fn fetch_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<ReleaseResult>, DatasourceError> {
        let name = query.lookup_name();
        let url = format!(
            "{}/{}",
            query.registry_url_or(NPM_REGISTRY),
            escape_package_name(name)
        );
        debug!(package = name, url = %redact_credentials(&url), "fetching npm package");

        let response = get(&self.client, &url, query.credentials.as_ref()).send().await?;
        let Some(response) = check_response(response)? else {
            return Ok(None);
        };

        let pkg: NpmPackageResponse = response.json().await?;
        Ok(Some(into_release_result(pkg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT_PAD: &str = r#"{
        "name": "left-pad",
        "homepage": "https://github.com/stevemao/left-pad#readme",
        "repository": { "type": "git", "url": "git+https://github.com/stevemao/left-pad.git" },
        "dist-tags": { "latest": "1.3.0", "next": "2.0.0-beta.1" },
        "versions": {
            "1.2.0": { "name": "left-pad", "version": "1.2.0" },
            "1.3.0": {
                "name": "left-pad",
                "version": "1.3.0",
                "deprecated": "use String.prototype.padStart()"
            }
        },
        "time": {
            "created": "2014-03-19T00:00:00.000Z",
            "1.2.0": "2017-11-06T00:00:00.000Z",
            "1.3.0": "2018-04-09T01:52:08.290Z"
        }
    }"#;

    #[test]
    fn test_into_release_result() {
        let pkg: NpmPackageResponse = serde_json::from_str(LEFT_PAD).unwrap();
        let mut result = into_release_result(pkg);
        result.releases.sort_by(|a, b| a.version.cmp(&b.version));

        assert_eq!(
            result.source_url.as_deref(),
            Some("git+https://github.com/stevemao/left-pad.git")
        );
        assert_eq!(result.tags.get("latest").map(String::as_str), Some("1.3.0"));
        assert_eq!(result.releases.len(), 2);
        assert!(!result.releases[0].is_deprecated);
        assert!(result.releases[1].is_deprecated);
        assert!(result.releases[1].release_timestamp.is_some());
    }

    #[test]
    fn test_repository_string_form() {
        let repo: Repository = serde_json::from_str(r#""github:user/repo""#).unwrap();
        assert_eq!(repo.url(), Some("github:user/repo"));
    }

    #[test]
    fn test_escape_scoped_name() {
        assert_eq!(escape_package_name("@types/node"), "@types%2Fnode");
        assert_eq!(escape_package_name("lodash"), "lodash");
    }

    // Hits the live registry
    #[tokio::test]
    #[ignore]
    async fn test_fetch_left_pad() {
        let ds = NpmDatasource::new();
        let result = ds
            .fetch_releases(&ReleaseQuery::new(ID, "left-pad"))
            .await
            .unwrap()
            .unwrap();
        assert!(result.releases.iter().any(|r| r.version == "1.3.0"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_missing_package() {
        let ds = NpmDatasource::new();
        let result = ds
            .fetch_releases(&ReleaseQuery::new(ID, "this-package-does-not-exist-relnotes"))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
