//! Datasources: where release lists come from, and how they are resolved.
//!
//! Each registry or code host implements [`Datasource`]. Adapters are
//! registered once into a [`DatasourceRegistry`]; a [`ReleaseResolver`] owns the
//! per-session cache and turns a [`ReleaseQuery`] into a filtered, sorted
//! [`ReleaseResult`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use crate::datasource::{DatasourceRegistry, ReleaseQuery, ReleaseResolver};
//!
//! let resolver = ReleaseResolver::new(Arc::new(DatasourceRegistry::with_defaults()));
//! let result = resolver.resolve(&ReleaseQuery::new("npm", "left-pad")).await?;
//! ```

#![allow(dead_code)]

mod cache;
mod client;
mod crates_io;
mod error;
mod github_tags;
mod go;
mod maven;
mod metadata;
mod npm;
mod pypi;
mod registry;
mod resolver;
pub mod source_url;

pub use client::{Credentials, Datasource, DigestQuery, Release, ReleaseQuery, ReleaseResult};
pub use error::{DatasourceError, ResolveError};
pub use registry::DatasourceRegistry;
pub use resolver::ReleaseResolver;

pub(crate) use client::{check_response, get as authorized_get};
