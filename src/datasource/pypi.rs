//! PyPI datasource.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::{Datasource, Release, ReleaseQuery, ReleaseResult, check_response, get};
use super::error::DatasourceError;
use crate::redact::redact_credentials;

pub const ID: &str = "pypi";

const PYPI_API: &str = "https://pypi.org/pypi";

/// `project_urls` labels that point at the repository, in preference order.
const SOURCE_LABELS: [&str; 5] = ["source", "source code", "repository", "code", "github"];

/// `project_urls` labels that point at a changelog.
const CHANGELOG_LABELS: [&str; 4] = ["changelog", "changes", "release notes", "history"];

/// PyPI datasource.
pub struct PypiDatasource {
    client: Client,
}

impl PypiDatasource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for PypiDatasource {
    fn default() -> Self {
        Self::new()
    }
}

// PyPI API response types
#[derive(Debug, Deserialize)]
struct PypiPackageResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<PypiFile>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    home_page: Option<String>,
    project_urls: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct PypiFile {
    upload_time_iso_8601: Option<DateTime<Utc>>,
    #[serde(default)]
    yanked: bool,
}

/// Normalize a project name per PEP 503.
fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_was_separator {
                normalized.push('-');
            }
            last_was_separator = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            last_was_separator = false;
        }
    }
    normalized
}

fn find_project_url(urls: &HashMap<String, String>, labels: &[&str]) -> Option<String> {
    labels.iter().find_map(|label| {
        urls.iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(label) && !value.is_empty())
            .map(|(_, value)| value.clone())
    })
}

fn into_release_result(pkg: PypiPackageResponse) -> ReleaseResult {
    let project_urls = pkg.info.project_urls.unwrap_or_default();

    let homepage = pkg
        .info
        .home_page
        .filter(|url| !url.is_empty())
        .or_else(|| find_project_url(&project_urls, &["homepage", "home"]));

    let releases = pkg
        .releases
        .into_iter()
        .map(|(version, files)| Release {
            // first upload of any file is the release time
            release_timestamp: files.iter().filter_map(|f| f.upload_time_iso_8601).min(),
            is_deprecated: !files.is_empty() && files.iter().all(|f| f.yanked),
            version,
            ..Default::default()
        })
        .collect();

    ReleaseResult {
        source_url: find_project_url(&project_urls, &SOURCE_LABELS),
        changelog_url: find_project_url(&project_urls, &CHANGELOG_LABELS),
        homepage,
        releases,
        ..Default::default()
    }
}

#[async_trait]
impl Datasource for PypiDatasource {
    async fn fetch_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<ReleaseResult>, DatasourceError> {
        let name = normalize_name(query.lookup_name());
        let url = format!("{}/{}/json", query.registry_url_or(PYPI_API), name);
        debug!(package = %name, url = %redact_credentials(&url), "fetching pypi package");

        let response = get(&self.client, &url, query.credentials.as_ref()).send().await?;
        let Some(response) = check_response(response)? else {
            return Ok(None);
        };

        let pkg: PypiPackageResponse = response.json().await?;
        Ok(Some(into_release_result(pkg)))
    }
}
