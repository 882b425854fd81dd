//! Release resolution: adapter dispatch, memoized fetch, per-caller filtering.

use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use super::cache::{CacheKey, ReleaseCache};
use super::client::{ReleaseQuery, ReleaseResult};
use super::error::ResolveError;
use super::metadata::add_metadata;
use super::registry::DatasourceRegistry;
use super::source_url;
use crate::redact::redact_all;
use crate::versioning::{self, VersionScheme};

/// Resolves release lists for one processing session.
///
/// The cache lives and dies with the resolver (or is wiped by [`reset`]), so
/// independent sessions never share lookups.
///
/// [`reset`]: ReleaseResolver::reset
pub struct ReleaseResolver {
    registry: Arc<DatasourceRegistry>,
    cache: ReleaseCache,
}

impl ReleaseResolver {
    pub fn new(registry: Arc<DatasourceRegistry>) -> Self {
        Self {
            registry,
            cache: ReleaseCache::new(),
        }
    }

    pub fn registry(&self) -> &DatasourceRegistry {
        &self.registry
    }

    /// Number of lookups memoized in this session.
    pub fn cached_lookups(&self) -> usize {
        self.cache.len()
    }

    /// Start a new session.
    pub fn reset(&self) {
        self.cache.clear();
    }

    /// Raw, enriched release data shared by every caller of the same lookup.
    ///
    /// The adapter runs at most once per `(datasource, lookup_name,
    /// registry_urls)` per session, however many callers ask concurrently.
    pub async fn get_raw_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<Arc<ReleaseResult>>, ResolveError> {
        if query.datasource.is_empty() {
            warn!(dep = %query.dep_name, "no datasource given");
            return Ok(None);
        }
        let Some(adapter) = self.registry.get(&query.datasource) else {
            warn!(datasource = %query.datasource, "unknown datasource");
            return Ok(None);
        };

        let key = CacheKey {
            datasource: query.datasource.clone(),
            lookup_name: query.lookup_name().to_string(),
            registry_urls: query.registry_urls.clone(),
        };

        let pending = self.cache.get_or_start(key.clone(), || {
            let query = query.clone();
            async move {
                debug!(
                    datasource = %query.datasource,
                    lookup = query.lookup_name(),
                    registries = %redact_all(&query.registry_urls),
                    "fetching releases"
                );
                let fetched = match adapter.fetch_releases(&query).await {
                    Ok(fetched) => fetched,
                    Err(err) => return Err(Arc::new(err)),
                };
                Ok(fetched
                    .filter(|result| !result.releases.is_empty())
                    .map(|mut result| {
                        add_metadata(&mut result, &query.datasource, query.lookup_name());
                        Arc::new(result)
                    }))
            }
            .boxed()
        });

        match pending.clone().await {
            Ok(Some(result)) => Ok(Some(result)),
            Ok(None) => {
                debug!(datasource = %key.datasource, lookup = %key.lookup_name, "no releases found");
                Ok(None)
            }
            Err(source) => {
                self.cache.evict(&key, &pending);
                Err(ResolveError::Upstream {
                    datasource: key.datasource,
                    lookup_name: key.lookup_name,
                    source,
                })
            }
        }
    }

    /// Resolve a query into releases valid under its version scheme, sorted
    /// ascending, with a normalized source URL.
    pub async fn resolve(&self, query: &ReleaseQuery) -> Result<Option<ReleaseResult>, ResolveError> {
        let Some(raw) = self.get_raw_releases(query).await? else {
            return Ok(None);
        };
        let scheme = versioning::get(query.versioning());
        Ok(Some(finalize_releases(&raw, scheme)))
    }

    /// Whether the datasource can produce digests. Performs no I/O.
    pub fn supports_digests(&self, datasource: &str) -> bool {
        self.registry
            .get(datasource)
            .is_some_and(|adapter| adapter.supports_digests())
    }

    /// Digest for the dependency, pinned to `value` when given. Not memoized.
    pub async fn get_digest(
        &self,
        query: &ReleaseQuery,
        value: Option<&str>,
    ) -> Result<Option<String>, ResolveError> {
        let Some(adapter) = self.registry.get(&query.datasource) else {
            warn!(datasource = %query.datasource, "unknown datasource");
            return Ok(None);
        };
        if !adapter.supports_digests() {
            debug!(datasource = %query.datasource, "datasource has no digest support");
            return Ok(None);
        }

        adapter
            .fetch_digest(&query.digest_query(value))
            .await
            .map_err(|err| ResolveError::Upstream {
                datasource: query.datasource.clone(),
                lookup_name: query.lookup_name().to_string(),
                source: Arc::new(err),
            })
    }
}

/// Per-caller post-processing of shared raw data: drop versions the scheme
/// rejects, stable-sort the rest ascending, normalize the source URL.
pub fn finalize_releases(raw: &ReleaseResult, scheme: &dyn VersionScheme) -> ReleaseResult {
    let mut result = raw.clone();
    result.releases.retain(|release| scheme.is_valid(&release.version));
    result
        .releases
        .sort_by(|a, b| scheme.compare(&a.version, &b.version));
    result.source_url = source_url::normalize(raw.source_url.as_deref());
    result
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::datasource::client::MockDatasource;
    use crate::datasource::{Datasource, DatasourceError, Release};

    /// Adapter that sleeps before answering and counts its invocations.
    struct SlowDatasource {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl Datasource for SlowDatasource {
        async fn fetch_releases(
            &self,
            query: &ReleaseQuery,
        ) -> Result<Option<ReleaseResult>, DatasourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Some(ReleaseResult {
                source_url: Some(format!("git+https://github.com/example/{}.git", query.lookup_name())),
                releases: vec![Release::new("1.1.0"), Release::new("1.0.0")],
                ..Default::default()
            }))
        }
    }

    fn releases(versions: &[&str]) -> ReleaseResult {
        ReleaseResult {
            releases: versions.iter().map(|v| Release::new(*v)).collect(),
            ..Default::default()
        }
    }

    fn resolver_with(id: &str, adapter: impl Datasource + 'static) -> ReleaseResolver {
        ReleaseResolver::new(Arc::new(
            DatasourceRegistry::builder().register(id, adapter).build(),
        ))
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = resolver_with(
            "npm",
            SlowDatasource {
                calls: calls.clone(),
                delay: Duration::from_millis(50),
            },
        );
        let query = ReleaseQuery::new("npm", "left-pad");

        let (a, b) = tokio::join!(
            resolver.get_raw_releases(&query),
            resolver.get_raw_releases(&query)
        );
        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));

        let (x, y) = tokio::join!(resolver.resolve(&query), resolver.resolve(&query));
        assert_eq!(x.unwrap(), y.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_starts_new_session() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = resolver_with(
            "npm",
            SlowDatasource {
                calls: calls.clone(),
                delay: Duration::from_millis(1),
            },
        );
        let query = ReleaseQuery::new("npm", "left-pad");

        resolver.resolve(&query).await.unwrap();
        resolver.resolve(&query).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        resolver.reset();
        assert_eq!(resolver.cached_lookups(), 0);
        resolver.resolve(&query).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolve_filters_and_sorts() {
        let mut mock = MockDatasource::new();
        mock.expect_fetch_releases()
            .times(1)
            .returning(|_| Ok(Some(releases(&["2.0.0", "not-a-version", "1.10.0", "1.2.0", "v1.5.0"]))));
        let resolver = resolver_with("npm", mock);

        let result = resolver
            .resolve(&ReleaseQuery::new("npm", "pkg"))
            .await
            .unwrap()
            .unwrap();
        let versions: Vec<&str> = result.releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["1.2.0", "v1.5.0", "1.10.0", "2.0.0"]);
    }

    #[tokio::test]
    async fn test_version_scheme_not_part_of_cache_key() {
        let mut mock = MockDatasource::new();
        mock.expect_fetch_releases()
            .times(1)
            .returning(|_| Ok(Some(releases(&["1.0", "1.0.1", "2"]))));
        let resolver = resolver_with("pypi", mock);

        let strict = resolver
            .resolve(&ReleaseQuery::new("pypi", "pkg"))
            .await
            .unwrap()
            .unwrap();
        let loose = resolver
            .resolve(&ReleaseQuery::new("pypi", "pkg").with_versioning("loose"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(strict.releases.len(), 1);
        assert_eq!(loose.releases.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_datasource_is_none_and_not_cached() {
        let resolver = ReleaseResolver::new(Arc::new(DatasourceRegistry::builder().build()));

        let result = resolver.resolve(&ReleaseQuery::new("rubygems", "rails")).await.unwrap();
        assert!(result.is_none());
        let result = resolver.resolve(&ReleaseQuery::new("", "rails")).await.unwrap();
        assert!(result.is_none());
        assert_eq!(resolver.cached_lookups(), 0);
    }

    #[tokio::test]
    async fn test_not_found_and_empty_are_none() {
        let mut mock = MockDatasource::new();
        mock.expect_fetch_releases()
            .withf(|q| q.lookup_name() == "missing")
            .times(1)
            .returning(|_| Ok(None));
        mock.expect_fetch_releases()
            .withf(|q| q.lookup_name() == "empty")
            .times(1)
            .returning(|_| Ok(Some(ReleaseResult::default())));
        let resolver = resolver_with("npm", mock);

        assert!(resolver.resolve(&ReleaseQuery::new("npm", "missing")).await.unwrap().is_none());
        assert!(resolver.resolve(&ReleaseQuery::new("npm", "empty")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates_and_is_retryable() {
        let mut mock = MockDatasource::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_fetch_releases()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DatasourceError::RateLimited));
        mock.expect_fetch_releases()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(releases(&["1.0.0"]))));
        let resolver = resolver_with("npm", mock);
        let query = ReleaseQuery::new("npm", "flaky");

        let err = resolver.resolve(&query).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Upstream { ref datasource, .. } if datasource == "npm"
        ));
        assert!(resolver.resolve(&query).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_metadata_applied_and_source_url_normalized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = resolver_with(
            "npm",
            SlowDatasource {
                calls,
                delay: Duration::from_millis(1),
            },
        );

        let raw = resolver
            .get_raw_releases(&ReleaseQuery::new("npm", "left-pad"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw.source_url.as_deref(), Some("https://github.com/example/left-pad"));
    }

    #[tokio::test]
    async fn test_digest_capability() {
        let mut plain = MockDatasource::new();
        plain.expect_supports_digests().return_const(false);
        plain.expect_fetch_digest().never();

        let mut tags = MockDatasource::new();
        tags.expect_supports_digests().return_const(true);
        tags.expect_fetch_digest()
            .withf(|q| q.lookup_name == "owner/repo" && q.value.as_deref() == Some("v1.0.0"))
            .times(1)
            .returning(|_| Ok(Some("abc123".to_string())));

        let resolver = ReleaseResolver::new(Arc::new(
            DatasourceRegistry::builder()
                .register("npm", plain)
                .register("github-tags", tags)
                .build(),
        ));

        assert!(!resolver.supports_digests("npm"));
        assert!(resolver.supports_digests("github-tags"));
        assert!(!resolver.supports_digests("unknown"));

        let npm = resolver
            .get_digest(&ReleaseQuery::new("npm", "left-pad"), None)
            .await
            .unwrap();
        assert!(npm.is_none());

        let digest = resolver
            .get_digest(&ReleaseQuery::new("github-tags", "owner/repo"), Some("v1.0.0"))
            .await
            .unwrap();
        assert_eq!(digest.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_finalize_is_stable_for_equal_versions() {
        let raw = releases(&["1.0", "1.0.0", "0.9"]);
        let result = finalize_releases(&raw, versioning::get("loose"));
        let versions: Vec<&str> = result.releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["0.9", "1.0", "1.0.0"]);
    }
}
