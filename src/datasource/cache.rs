//! Per-session memoization of release lookups.
//!
//! Entries hold the *pending* fetch, inserted before it completes, so callers
//! racing on the same key all await one upstream request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};

use super::client::ReleaseResult;
use super::error::DatasourceError;

/// Outcome of one fetch, cloneable so every waiter gets a copy.
pub type FetchOutcome = Result<Option<Arc<ReleaseResult>>, Arc<DatasourceError>>;

/// A fetch that may still be in flight.
pub type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Raw release data does not depend on the version scheme, so it is not part
/// of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub datasource: String,
    pub lookup_name: String,
    pub registry_urls: Vec<String>,
}

/// Memoized release lookups for one processing session.
#[derive(Default)]
pub struct ReleaseCache {
    entries: Mutex<HashMap<CacheKey, SharedFetch>>,
}

impl ReleaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, SharedFetch>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the pending fetch for `key`, starting it with `fetch` if absent.
    ///
    /// Check and insert happen under one lock; `fetch` only builds the future
    /// and does not poll it, so the lock is never held across I/O.
    pub fn get_or_start<F>(&self, key: CacheKey, fetch: F) -> SharedFetch
    where
        F: FnOnce() -> BoxFuture<'static, FetchOutcome>,
    {
        self.entries()
            .entry(key)
            .or_insert_with(|| fetch().shared())
            .clone()
    }

    /// Drop a failed entry so a later call in the same session can retry.
    /// Leaves the slot alone if it was already replaced.
    pub fn evict(&self, key: &CacheKey, failed: &SharedFetch) {
        let mut entries = self.entries();
        if entries.get(key).is_some_and(|current| current.ptr_eq(failed)) {
            entries.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Forget everything. Called between independent sessions.
    pub fn clear(&self) {
        self.entries().clear();
    }
}
