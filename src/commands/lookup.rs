//! Arguments shared by every command that looks up a dependency.

use std::sync::Arc;

use clap::Args;

use crate::config::RelnotesConfig;
use crate::datasource::{DatasourceRegistry, ReleaseQuery, ReleaseResolver};

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    /// Datasource id (npm, pypi, crates, go, maven, github-tags)
    pub datasource: String,

    /// Dependency name
    pub name: String,

    /// Name to query the registry with, when it differs from the dependency name
    #[arg(long)]
    pub lookup_name: Option<String>,

    /// Registry URL to use instead of the default (repeatable)
    #[arg(long = "registry-url")]
    pub registry_urls: Vec<String>,

    /// Version scheme (semver, loose)
    #[arg(long)]
    pub versioning: Option<String>,
}

impl LookupArgs {
    /// Build the query, filling registry URLs and credentials from config.
    pub fn to_query(&self, config: &RelnotesConfig) -> ReleaseQuery {
        let registry_urls = if self.registry_urls.is_empty() {
            config.registry_urls_for(&self.datasource)
        } else {
            self.registry_urls.clone()
        };

        let mut query =
            ReleaseQuery::new(&self.datasource, &self.name).with_registry_urls(registry_urls);
        if let Some(lookup_name) = &self.lookup_name {
            query = query.with_lookup_name(lookup_name);
        }
        if let Some(versioning) = &self.versioning {
            query = query.with_versioning(versioning);
        }
        if self.datasource == "github-tags"
            && let Some(credentials) = config.github_credentials()
        {
            query = query.with_credentials(credentials);
        }
        query
    }
}

/// A resolver over every built-in datasource.
pub fn default_resolver() -> ReleaseResolver {
    ReleaseResolver::new(Arc::new(DatasourceRegistry::with_defaults()))
}
