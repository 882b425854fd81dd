//! crates.io datasource.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::{Datasource, Release, ReleaseQuery, ReleaseResult, check_response, get};
use super::error::DatasourceError;
use crate::redact::redact_credentials;

pub const ID: &str = "crates";

const CRATES_API: &str = "https://crates.io/api/v1";

// crates.io rejects requests without a user agent
const USER_AGENT: &str = concat!("relnotes/", env!("CARGO_PKG_VERSION"));

/// crates.io datasource.
pub struct CratesIoDatasource {
    client: Client,
}

impl CratesIoDatasource {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

impl Default for CratesIoDatasource {
    fn default() -> Self {
        Self::new()
    }
}

// crates.io API response types
#[derive(Debug, Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
    versions: Vec<CrateVersionInfo>,
}

#[derive(Debug, Deserialize)]
struct CrateInfo {
    homepage: Option<String>,
    repository: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrateVersionInfo {
    num: String,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    yanked: bool,
}

fn into_release_result(resp: CrateResponse) -> ReleaseResult {
    ReleaseResult {
        source_url: resp.krate.repository,
        homepage: resp.krate.homepage,
        releases: resp
            .versions
            .into_iter()
            .map(|v| Release {
                version: v.num,
                release_timestamp: v.created_at,
                is_deprecated: v.yanked,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

#[async_trait]
impl Datasource for CratesIoDatasource {
    async fn fetch_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<ReleaseResult>, DatasourceError> {
        let name = query.lookup_name();
        let url = format!("{}/crates/{}", query.registry_url_or(CRATES_API), name);
        debug!(package = name, url = %redact_credentials(&url), "fetching crate");

        let response = get(&self.client, &url, query.credentials.as_ref()).send().await?;
        let Some(response) = check_response(response)? else {
            return Ok(None);
        };

        let resp: CrateResponse = response.json().await?;
        Ok(Some(into_release_result(resp)))
    }
}
