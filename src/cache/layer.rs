//! Read-through cache service.
//!
//! [`TagCache`] is the handle handlers share. It wraps a [`CacheStore`] behind
//! an async lock that is only ever held for in-memory bookkeeping; the lock is
//! released while a value is being computed, so concurrent misses on the same
//! key each run their own computation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::store::InsertOutcome;
use crate::cache::{CacheError, CacheKey, CacheStats, CacheStore, CacheTag, TtlClass, TtlPolicy};

#[derive(Clone, Debug)]
pub struct TagCache {
    store: Arc<RwLock<CacheStore>>,
    ttl: TtlPolicy,
}

impl TagCache {
    pub fn new(max_entries: usize, ttl: TtlPolicy) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(max_entries))),
            ttl,
        }
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        self.ttl
    }

    /// Returns the cached result of `operation(args)` or computes and caches it.
    ///
    /// A failed computation is returned to the caller unchanged and nothing
    /// is stored for it.
    pub async fn get_or_compute<A, T, E, F, Fut>(
        &self,
        operation: &str,
        args: &A,
        tags: Vec<CacheTag>,
        class: TtlClass,
        compute: F,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_compute_tagged(operation, args, tags, class, compute, |_| Vec::new())
            .await
    }

    /// Like [`TagCache::get_or_compute`], additionally registering the entry
    /// under the tags `derive_tags` extracts from the computed value.
    pub async fn get_or_compute_tagged<A, T, E, F, Fut, D>(
        &self,
        operation: &str,
        args: &A,
        mut tags: Vec<CacheTag>,
        class: TtlClass,
        compute: F,
        derive_tags: D,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        D: FnOnce(&T) -> Vec<CacheTag>,
    {
        let key = CacheKey::derive(operation, args)?;

        let started = {
            let mut store = self.store.write().await;
            if let Some(raw) = store.get(&key) {
                match serde_json::from_str::<T>(&raw) {
                    Ok(value) => {
                        debug!(key = %key, "cache hit");
                        return Ok(value);
                    }
                    Err(err) => {
                        warn!(key = %key, error = %err, "dropping undecodable cache entry");
                        store.remove(&key);
                    }
                }
            }
            store.current_epoch()
        };

        debug!(key = %key, "cache miss");
        let value = compute().await?;

        let serialized = serde_json::to_string(&value).map_err(CacheError::from)?;
        tags.extend(derive_tags(&value));
        let ttl = self.ttl.duration(class);

        let outcome = self
            .store
            .write()
            .await
            .insert(key.clone(), serialized, tags, ttl, started);
        match outcome {
            Ok(InsertOutcome::Stored) => {}
            Ok(InsertOutcome::SkippedStale) => {
                debug!(key = %key, "not caching result computed across an invalidation");
            }
            Err(err) => {
                warn!(key = %key, error = %err, "result served uncached");
            }
        }

        Ok(value)
    }

    /// Evicts every entry registered under any of `tags`.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate(&self, tags: &[CacheTag]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let removed = self.store.write().await.invalidate(tags);
        info!(
            tags = ?tags.iter().map(CacheTag::as_str).collect::<Vec<_>>(),
            removed,
            "cache tags invalidated"
        );
        removed
    }

    /// Removes expired entries and stale tag epochs.
    pub async fn purge_expired(&self) -> usize {
        let retention = self.epoch_retention();
        self.store.write().await.purge_expired(retention)
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn tagged_len(&self, tag: &CacheTag) -> usize {
        self.store.read().await.tagged_len(tag)
    }

    // A computation that outlives every TTL class is not expected; past that
    // horizon a tag's invalidation epoch is forgotten.
    fn epoch_retention(&self) -> Duration {
        self.ttl.longest()
    }
}

impl Default for TagCache {
    fn default() -> Self {
        Self::new(1000, TtlPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;
    use uuid::Uuid;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("backend down")]
        Backend,
        #[error(transparent)]
        Cache(#[from] CacheError),
    }

    async fn counted(
        cache: &TagCache,
        calls: &AtomicUsize,
        id: Uuid,
        value: u64,
    ) -> Result<u64, TestError> {
        cache
            .get_or_compute("getMeme", &id, vec![CacheTag::meme(id)], TtlClass::Default, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            })
            .await
    }

    #[tokio::test]
    async fn test_hit_skips_compute() {
        let cache = TagCache::default();
        let calls = AtomicUsize::new(0);
        let id = Uuid::new_v4();

        assert_eq!(counted(&cache, &calls, id, 7).await.unwrap(), 7);
        assert_eq!(counted(&cache, &calls, id, 8).await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let cache = TagCache::default();
        let calls = AtomicUsize::new(0);
        let id = Uuid::new_v4();

        counted(&cache, &calls, id, 1).await.unwrap();
        assert_eq!(cache.invalidate(&[CacheTag::meme(id)]).await, 1);
        assert_eq!(counted(&cache, &calls, id, 2).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_tag_isolation() {
        let cache = TagCache::default();
        let calls = AtomicUsize::new(0);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        counted(&cache, &calls, a, 1).await.unwrap();
        counted(&cache, &calls, b, 2).await.unwrap();
        cache.invalidate(&[CacheTag::meme(a)]).await;

        assert_eq!(counted(&cache, &calls, b, 99).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = TagCache::default();
        let id = Uuid::new_v4();

        let result: Result<u64, TestError> = cache
            .get_or_compute("getMeme", &id, vec![], TtlClass::Default, || async {
                Err(TestError::Backend)
            })
            .await;
        assert!(matches!(result, Err(TestError::Backend)));
        assert!(cache.is_empty().await);

        let calls = AtomicUsize::new(0);
        assert_eq!(counted(&cache, &calls, id, 5).await.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_derived_tags_register_entry() {
        let cache = TagCache::default();
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];

        let page: Result<Vec<Uuid>, TestError> = cache
            .get_or_compute_tagged(
                "getRecentMemes",
                &(0, 20),
                vec![CacheTag::memes()],
                TtlClass::Default,
                || async { Ok(ids.clone()) },
                |page: &Vec<Uuid>| page.iter().copied().map(CacheTag::meme).collect(),
            )
            .await;
        assert_eq!(page.unwrap().len(), 2);

        assert_eq!(cache.tagged_len(&CacheTag::meme(ids[1])).await, 1);
        assert_eq!(cache.invalidate(&[CacheTag::meme(ids[1])]).await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputed() {
        let ttl = TtlPolicy::new(
            Duration::from_millis(30),
            Duration::from_millis(30),
            Duration::from_millis(30),
        );
        let cache = TagCache::new(10, ttl);
        let calls = AtomicUsize::new(0);
        let id = Uuid::new_v4();

        counted(&cache, &calls, id, 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        counted(&cache, &calls, id, 2).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_invalidation_during_compute_is_not_sticky() {
        let cache = TagCache::default();
        let id = Uuid::new_v4();

        let stale: Result<u64, TestError> = cache
            .get_or_compute("getMeme", &id, vec![CacheTag::meme(id)], TtlClass::Default, || {
                let cache = cache.clone();
                async move {
                    // The mutation commits and invalidates before this read stores.
                    cache.invalidate(&[CacheTag::meme(id)]).await;
                    Ok(1)
                }
            })
            .await;
        assert_eq!(stale.unwrap(), 1);
        assert!(cache.is_empty().await);

        let calls = AtomicUsize::new(0);
        assert_eq!(counted(&cache, &calls, id, 2).await.unwrap(), 2);
    }
}
