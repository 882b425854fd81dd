//! Datasource and resolution errors.

use std::sync::Arc;

use thiserror::Error;

/// Transport or parse fault raised by a datasource adapter.
///
/// "Not found" is never an error: adapters answer `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum DatasourceError {
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("rate limited")]
    RateLimited,
}

/// Failure surfaced by the release resolver to its callers.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The adapter failed. The source is shared between every caller that
    /// awaited the same pending lookup.
    #[error("failed to fetch {datasource}:{lookup_name}: {source}")]
    Upstream {
        datasource: String,
        lookup_name: String,
        source: Arc<DatasourceError>,
    },
}
