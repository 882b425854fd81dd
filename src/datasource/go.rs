//! Go module proxy datasource.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::client::{Datasource, Release, ReleaseQuery, ReleaseResult, check_response, get};
use super::error::DatasourceError;
use crate::redact::redact_credentials;

pub const ID: &str = "go";

const GO_PROXY: &str = "https://proxy.golang.org";

/// Hosts whose module paths map directly onto a repository.
const REPOSITORY_HOSTS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];

/// Go module proxy datasource.
pub struct GoDatasource {
    client: Client,
}

impl GoDatasource {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

impl Default for GoDatasource {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape module path for Go proxy URL.
/// Uppercase letters become ! followed by lowercase.
/// e.g., github.com/BurntSushi/toml -> github.com/!burnt!sushi/toml
fn escape_module(module: &str) -> String {
    let mut result = String::with_capacity(module.len() + 10);
    for c in module.chars() {
        if c.is_ascii_uppercase() {
            result.push('!');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Repository URL for modules hosted on a known code host.
///
/// `github.com/owner/repo/v2/sub` -> `https://github.com/owner/repo`
fn repository_url(module: &str) -> Option<String> {
    let mut parts = module.split('/');
    let host = parts.next()?;
    if !REPOSITORY_HOSTS.contains(&host) {
        return None;
    }
    let owner = parts.next()?;
    let repo = parts.next()?;
    Some(format!("https://{}/{}/{}", host, owner, repo))
}

fn parse_version_list(body: &str) -> Vec<Release> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Release::new)
        .collect()
}

#[async_trait]
impl Datasource for GoDatasource {
    async fn fetch_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<ReleaseResult>, DatasourceError> {
        let module = query.lookup_name();
        let url = format!(
            "{}/{}/@v/list",
            query.registry_url_or(GO_PROXY),
            escape_module(module)
        );
        debug!(package = module, url = %redact_credentials(&url), "fetching go module versions");

        let response = get(&self.client, &url, query.credentials.as_ref()).send().await?;
        let Some(response) = check_response(response)? else {
            return Ok(None);
        };

        let releases = parse_version_list(&response.text().await?);
        if releases.is_empty() {
            return Ok(None);
        }

        Ok(Some(ReleaseResult {
            source_url: repository_url(module),
            releases,
            ..Default::default()
        }))
    }
}
