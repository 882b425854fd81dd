//! Changelog provider errors.

use thiserror::Error;

use crate::datasource::DatasourceError;

#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("invalid source url: {0}")]
    InvalidSourceUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Upstream(#[from] DatasourceError),
}
