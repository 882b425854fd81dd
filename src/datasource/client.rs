//! Datasource trait and the release data model it produces.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::DatasourceError;
use crate::versioning::DEFAULT_SCHEME;

/// Token presented to a registry or host API.
#[derive(Debug, Clone)]
pub struct Credentials {
    token: Arc<SecretString>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(SecretString::from(token.into())),
        }
    }

    /// Attach the token to an outgoing request.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }
}

/// One release resolution request. Immutable once issued.
#[derive(Debug, Clone, Default)]
pub struct ReleaseQuery {
    /// Datasource identifier (e.g. `"npm"`).
    pub datasource: String,
    /// Dependency name as written in the manifest.
    pub dep_name: String,
    /// Registry-side name, when it differs from `dep_name`.
    pub lookup_name: Option<String>,
    /// Registry base URLs overriding the adapter default.
    pub registry_urls: Vec<String>,
    /// Version scheme id, `"semver"` when absent.
    pub versioning: Option<String>,
    pub credentials: Option<Credentials>,
}

impl ReleaseQuery {
    pub fn new(datasource: impl Into<String>, dep_name: impl Into<String>) -> Self {
        Self {
            datasource: datasource.into(),
            dep_name: dep_name.into(),
            ..Default::default()
        }
    }

    pub fn with_lookup_name(mut self, lookup_name: impl Into<String>) -> Self {
        self.lookup_name = Some(lookup_name.into());
        self
    }

    pub fn with_registry_urls(mut self, registry_urls: Vec<String>) -> Self {
        self.registry_urls = registry_urls;
        self
    }

    pub fn with_versioning(mut self, versioning: impl Into<String>) -> Self {
        self.versioning = Some(versioning.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Name to look up in the registry; falls back to the dependency name.
    pub fn lookup_name(&self) -> &str {
        match self.lookup_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.dep_name,
        }
    }

    pub fn versioning(&self) -> &str {
        self.versioning.as_deref().unwrap_or(DEFAULT_SCHEME)
    }

    /// First configured registry URL (without trailing slash), or `default`.
    pub fn registry_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.registry_urls
            .first()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(default)
    }

    /// Equivalent digest lookup for the same dependency.
    pub fn digest_query(&self, value: Option<&str>) -> DigestQuery {
        DigestQuery {
            lookup_name: self.lookup_name().to_string(),
            registry_urls: self.registry_urls.clone(),
            value: value.map(str::to_string),
            credentials: self.credentials.clone(),
        }
    }
}

/// One published version of a dependency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Release {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }
}

/// Everything a datasource knows about a dependency's releases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    pub releases: Vec<Release>,
    /// Tag name to version (npm dist-tags).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Digest lookup request.
#[derive(Debug, Clone, Default)]
pub struct DigestQuery {
    pub lookup_name: String,
    pub registry_urls: Vec<String>,
    /// Specific version or tag to pin. `None` means the current head.
    pub value: Option<String>,
    pub credentials: Option<Credentials>,
}

/// Capability contract every registry or host plugin implements.
///
/// Adapters return `Ok(None)` when the upstream has nothing for the lookup and
/// reserve errors for transport and parse faults.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Datasource: Send + Sync {
    /// Fetch the raw release list for a dependency.
    async fn fetch_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<ReleaseResult>, DatasourceError>;

    /// Whether `fetch_digest` is implemented. Must not perform any I/O.
    fn supports_digests(&self) -> bool {
        false
    }

    /// Fetch a content digest (commit SHA, image digest, ...).
    async fn fetch_digest(&self, _query: &DigestQuery) -> Result<Option<String>, DatasourceError> {
        Ok(None)
    }
}

/// Map a registry response onto the not-found / error taxonomy.
///
/// 404 and 410 become `Ok(None)`, 429 is `RateLimited`, any other
/// non-success status is an error.
pub(crate) fn check_response(response: Response) -> Result<Option<Response>, DatasourceError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Ok(None);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(DatasourceError::RateLimited);
    }
    if !status.is_success() {
        return Err(DatasourceError::Status {
            status: status.as_u16(),
            url: crate::redact::redact_credentials(response.url().as_str()),
        });
    }
    Ok(Some(response))
}

/// Build an authorized GET request.
pub(crate) fn get(
    client: &reqwest::Client,
    url: &str,
    credentials: Option<&Credentials>,
) -> RequestBuilder {
    let request = client.get(url);
    match credentials {
        Some(credentials) => credentials.authorize(request),
        None => request,
    }
}
