//! Scoped read-through cache for catalog option lists.
//!
//! Each hierarchy level gets its own [`ScopedCache`], keyed by the natural
//! scope of that level:
//!
//! - sub-regions and localities: the region id
//! - postal codes: a [`PostalScope`] of `(region id, locality name)`
//!
//! ## Design
//!
//! - **Session scoped**: entries never expire and are never evicted; the
//!   whole cache goes away with the controller that owns it.
//! - **Immutable entries**: once stored, an entry is never replaced. A changed
//!   upstream selection produces a different key.
//! - **Request coalescing**: concurrent misses for the same key share one
//!   in-flight load. A failed load is delivered to every waiter and is not
//!   stored, so the next call loads again.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use locus_catalog::CatalogError;

type LoadResult = Result<Arc<[String]>, CatalogError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Cache key for the postal codes of one locality.
///
/// A structured key rather than a joined string, so `(A, X)` can never alias
/// another region/locality pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalScope {
    pub region_id: String,
    pub locality: String,
}

impl PostalScope {
    pub fn new(region_id: impl Into<String>, locality: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            locality: locality.into(),
        }
    }
}

impl fmt::Display for PostalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region_id, self.locality)
    }
}

/// A stored option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub values: Arc<[String]>,
    /// Logical tick at which the entry was stored (1-based, per cache).
    pub fetched_at: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Loader invocations (misses that did not join an in-flight load).
    pub loads: u64,
}

/// Read-through, coalescing cache of option lists.
pub struct ScopedCache<K> {
    name: &'static str,
    entries: DashMap<K, CacheEntry>,
    in_flight: Mutex<HashMap<K, SharedLoad>>,
    tick: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
}

impl<K> ScopedCache<K>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
{
    /// Create an empty cache. `name` only appears in log output.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            in_flight: Mutex::new(HashMap::new()),
            tick: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        }
    }

    /// Returns the stored entry for `key`, without loading.
    pub fn get(&self, key: &K) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Returns the cached list for `key`, loading it with `loader` on a miss.
    ///
    /// If a load for `key` is already in flight, waits for that load instead
    /// of calling `loader`.
    pub async fn get_or_load<F, Fut>(&self, key: K, loader: F) -> LoadResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, CatalogError>> + Send + 'static,
    {
        if let Some(values) = self.hit(&key) {
            return Ok(values);
        }

        let load = {
            let mut in_flight = self.lock_in_flight();
            // a load may have settled between the first check and taking the lock
            if let Some(values) = self.hit(&key) {
                return Ok(values);
            }
            self.misses.fetch_add(1, Ordering::Relaxed);

            match in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!(cache = self.name, %key, "joining in-flight load");
                    pending.clone()
                }
                None => {
                    tracing::debug!(cache = self.name, %key, "cache miss, loading");
                    self.loads.fetch_add(1, Ordering::Relaxed);
                    let load = loader()
                        .map(|result| result.map(Arc::<[String]>::from))
                        .boxed()
                        .shared();
                    in_flight.insert(key.clone(), load.clone());
                    load
                }
            }
        };

        let result = load.clone().await;
        self.settle(&key, &load, &result);
        result
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn hit(&self, key: &K) -> Option<Arc<[String]>> {
        let values = self.entries.get(key).map(|e| e.values.clone())?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(cache = self.name, %key, "cache hit");
        Some(values)
    }

    /// Stores a successful result and releases the in-flight slot.
    ///
    /// Every waiter calls this; only the first success is stored and the slot
    /// is only removed if it still holds this very load.
    fn settle(&self, key: &K, load: &SharedLoad, result: &LoadResult) {
        let mut in_flight = self.lock_in_flight();
        match result {
            Ok(values) => {
                self.entries.entry(key.clone()).or_insert_with(|| CacheEntry {
                    values: values.clone(),
                    fetched_at: self.tick.fetch_add(1, Ordering::Relaxed) + 1,
                });
            }
            Err(e) => {
                tracing::debug!(cache = self.name, %key, error = %e, "load failed, not cached");
            }
        }
        if in_flight.get(key).is_some_and(|pending| pending.ptr_eq(load)) {
            in_flight.remove(key);
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<K, SharedLoad>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Eq + Hash> fmt::Debug for ScopedCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedCache")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locus_catalog::CatalogOperation;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        values: &'static [&'static str],
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<String>, CatalogError>> {
        let calls = calls.clone();
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(values.iter().map(|s| s.to_string()).collect())
            }
            .boxed()
        }
    }

    fn failing_loader(
        calls: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<String>, CatalogError>> {
        let calls = calls.clone();
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(CatalogError::unavailable(
                    CatalogOperation::ListLocalities,
                    "boom",
                ))
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_is_served_from_cache() {
        let cache = ScopedCache::<String>::new("localities");
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_load("mh".into(), counting_loader(&calls, &["Mumbai", "Pune"]))
            .await
            .unwrap();
        let second = cache
            .get_or_load("mh".into(), counting_loader(&calls, &["other"]))
            .await
            .unwrap();

        assert_eq!(&*first, &["Mumbai".to_string(), "Pune".to_string()]);
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1,
                loads: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_load() {
        let cache = ScopedCache::<String>::new("localities");
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_load("mh".into(), counting_loader(&calls, &["Mumbai"])),
            cache.get_or_load("mh".into(), counting_loader(&calls, &["Mumbai"])),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().loads, 1);
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_reaches_every_waiter_and_is_not_cached() {
        let cache = ScopedCache::<String>::new("localities");
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_load("mh".into(), failing_loader(&calls)),
            cache.get_or_load("mh".into(), failing_loader(&calls)),
        );
        assert!(a.is_err());
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());

        // the failed load released its slot, so a retry reaches the loader
        let retried = cache
            .get_or_load("mh".into(), counting_loader(&calls, &["Mumbai"]))
            .await;
        assert!(retried.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_postal_scopes_do_not_alias() {
        let cache = ScopedCache::<PostalScope>::new("postal_codes");
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_load(PostalScope::new("a", "x"), counting_loader(&calls, &["111"]))
            .await
            .unwrap();
        let other_locality = cache
            .get_or_load(PostalScope::new("a", "z"), counting_loader(&calls, &["222"]))
            .await
            .unwrap();
        let other_region = cache
            .get_or_load(PostalScope::new("a2", "x"), counting_loader(&calls, &["333"]))
            .await
            .unwrap();

        assert_eq!(&*other_locality, &["222".to_string()]);
        assert_eq!(&*other_region, &["333".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_record_fetch_order() {
        let cache = ScopedCache::<String>::new("sub_regions");
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_load("a".into(), counting_loader(&calls, &["1"]))
            .await
            .unwrap();
        cache
            .get_or_load("b".into(), counting_loader(&calls, &["2"]))
            .await
            .unwrap();

        assert_eq!(cache.get(&"a".to_string()).unwrap().fetched_at, 1);
        assert_eq!(cache.get(&"b".to_string()).unwrap().fetched_at, 2);
        assert!(cache.get(&"c".to_string()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debug_shows_name_and_entry_count() {
        let cache = ScopedCache::<PostalScope>::new("postal_codes");
        let calls = Arc::new(AtomicUsize::new(0));
        cache
            .get_or_load(
                PostalScope::new("mh", "Pune"),
                counting_loader(&calls, &["411001"]),
            )
            .await
            .unwrap();

        let debug = format!("{cache:?}");
        assert!(debug.contains("postal_codes"), "{debug}");
        assert!(debug.contains("entries: 1"), "{debug}");
    }
}
