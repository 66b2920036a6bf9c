//! Cache Store Module
//!
//! Synchronous cache engine: key → entry storage, a tag → key multimap for
//! bulk invalidation, per-tag invalidation epochs, LRU capacity control and
//! TTL expiry.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{
    CacheEntry, CacheError, CacheKey, CacheStats, CacheTag, LruTracker, MAX_VALUE_SIZE,
};

/// Monotonic invalidation counter.
pub type Epoch = u64;

/// Outcome of [`CacheStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Stored,
    /// One of the entry's tags was invalidated after the computation began,
    /// so the value may predate a committed mutation.
    SkippedStale,
}

#[derive(Debug, Clone, Copy)]
struct TagEpoch {
    epoch: Epoch,
    at_ms: u64,
}

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Keys registered under each tag
    tag_index: HashMap<CacheTag, HashSet<CacheKey>>,
    /// Epoch at which each tag was last invalidated
    tag_epochs: HashMap<CacheTag, TagEpoch>,
    epoch: Epoch,
    lru: LruTracker,
    stats: CacheStats,
    max_entries: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            tag_index: HashMap::new(),
            tag_epochs: HashMap::new(),
            epoch: 0,
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Current invalidation epoch. Callers capture it before computing a value
    /// and hand it back to [`CacheStore::insert`].
    pub fn current_epoch(&self) -> Epoch {
        self.epoch
    }

    // == Get ==
    /// Returns the serialized value for `key` if a live entry exists.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &CacheKey) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove(key);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Insert ==
    /// Stores `value` under `key`, registered under `tags`.
    ///
    /// `started` is the epoch observed before the value was computed. If any
    /// of `tags` has been invalidated since then the value is discarded.
    pub fn insert(
        &mut self,
        key: CacheKey,
        value: String,
        tags: Vec<CacheTag>,
        ttl: Duration,
        started: Epoch,
    ) -> Result<InsertOutcome, CacheError> {
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::ValueTooLarge {
                size: value.len(),
                limit: MAX_VALUE_SIZE,
            });
        }

        let stale = tags.iter().any(|tag| {
            self.tag_epochs
                .get(tag)
                .is_some_and(|invalidated| invalidated.epoch > started)
        });
        if stale {
            self.stats.record_skipped_store();
            return Ok(InsertOutcome::SkippedStale);
        }

        // Replace rather than update so the old tag registrations go away.
        self.remove(&key);

        if self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.unlink(&evicted);
                self.stats.record_eviction();
            }
        }

        let mut tags = tags;
        tags.sort();
        tags.dedup();
        for tag in &tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }

        self.entries
            .insert(key.clone(), CacheEntry::new(value, tags, ttl));
        self.lru.touch(&key);
        self.stats.record_store();
        self.stats.set_total_entries(self.entries.len());

        Ok(InsertOutcome::Stored)
    }

    // == Invalidate ==
    /// Evicts every entry registered under any of `tags`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, tags: &[CacheTag]) -> usize {
        self.epoch += 1;
        let now = current_timestamp_ms();

        let mut doomed = HashSet::new();
        for tag in tags {
            self.tag_epochs.insert(
                tag.clone(),
                TagEpoch {
                    epoch: self.epoch,
                    at_ms: now,
                },
            );
            if let Some(keys) = self.tag_index.remove(tag) {
                doomed.extend(keys);
            }
        }

        let count = doomed.len();
        for key in &doomed {
            self.remove(key);
        }

        self.stats.record_invalidated(count);
        count
    }

    // == Remove ==
    /// Drops a single entry along with its tag registrations.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        self.lru.remove(key);
        let removed = self.unlink(key);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    fn unlink(&mut self, key: &CacheKey) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        for tag in &entry.tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        true
    }

    // == Purge Expired ==
    /// Removes every expired entry and forgets tag epochs older than
    /// `epoch_retention`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, epoch_retention: Duration) -> usize {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired.len();
        for key in &expired {
            self.remove(key);
        }

        let retention_ms = u64::try_from(epoch_retention.as_millis()).unwrap_or(u64::MAX);
        let cutoff = current_timestamp_ms().saturating_sub(retention_ms);
        self.tag_epochs.retain(|_, invalidated| invalidated.at_ms >= cutoff);

        count
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live entries registered under `tag`.
    pub fn tagged_len(&self, tag: &CacheTag) -> usize {
        self.tag_index.get(tag).map_or(0, HashSet::len)
    }

    /// Number of tags with a remembered invalidation epoch.
    pub fn tracked_epochs(&self) -> usize {
        self.tag_epochs.len()
    }
}
