//! Fixed mapping from datasource id to adapter, built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use super::client::Datasource;
use super::{crates_io, github_tags, go, maven, npm, pypi};

/// Read-only datasource lookup table.
pub struct DatasourceRegistry {
    adapters: HashMap<String, Arc<dyn Datasource>>,
}

impl DatasourceRegistry {
    pub fn builder() -> DatasourceRegistryBuilder {
        DatasourceRegistryBuilder::default()
    }

    /// Registry with every built-in adapter.
    pub fn with_defaults() -> Self {
        Self::builder()
            .register(npm::ID, npm::NpmDatasource::new())
            .register(pypi::ID, pypi::PypiDatasource::new())
            .register(crates_io::ID, crates_io::CratesIoDatasource::new())
            .register(go::ID, go::GoDatasource::new())
            .register(maven::ID, maven::MavenDatasource::new())
            .register(github_tags::ID, github_tags::GithubTagsDatasource::new())
            .build()
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Datasource>> {
        self.adapters.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.adapters.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Default)]
pub struct DatasourceRegistryBuilder {
    adapters: HashMap<String, Arc<dyn Datasource>>,
}

impl DatasourceRegistryBuilder {
    pub fn register(self, id: impl Into<String>, adapter: impl Datasource + 'static) -> Self {
        self.register_arc(id, Arc::new(adapter))
    }

    pub fn register_arc(mut self, id: impl Into<String>, adapter: Arc<dyn Datasource>) -> Self {
        self.adapters.insert(id.into(), adapter);
        self
    }

    pub fn build(self) -> DatasourceRegistry {
        DatasourceRegistry {
            adapters: self.adapters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids() {
        let registry = DatasourceRegistry::with_defaults();
        assert_eq!(
            registry.ids(),
            vec!["crates", "github-tags", "go", "maven", "npm", "pypi"]
        );
        assert!(registry.contains("npm"));
        assert!(registry.get("rubygems").is_none());
    }
}
