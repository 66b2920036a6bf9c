//! Cache Entry Module
//!
//! Defines a single memoized read result together with its tags and expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cache::CacheTag;

// == Cache Entry ==
/// A memoized read result.
///
/// The value is kept in its serialized JSON form so that a hit returns the
/// exact bytes produced by the original computation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized result payload
    pub value: String,
    /// Invalidation scopes this entry is registered under
    pub tags: Vec<CacheTag>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` after now.
    ///
    /// # Arguments
    /// * `value` - Serialized payload
    /// * `tags` - Tags the entry is registered under
    /// * `ttl` - Lifetime of the entry
    pub fn new(value: String, tags: Vec<CacheTag>, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            value,
            tags,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero TTL produces an entry that is never served.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    /// Returns true if the entry is registered under `tag`.
    pub fn has_tag(&self, tag: &CacheTag) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(
            "[1,2]".to_string(),
            vec![CacheTag::memes()],
            Duration::from_secs(60),
        );

        assert_eq!(entry.value, "[1,2]");
        assert!(entry.has_tag(&CacheTag::memes()));
        assert!(!entry.has_tag(&CacheTag::users()));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("v".to_string(), vec![], Duration::from_millis(50));

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(80));
        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = CacheEntry::new("v".to_string(), vec![], Duration::from_secs(10));

        let remaining = entry.ttl_remaining_ms();
        assert!(remaining <= 10_000);
        assert!(remaining >= 9_000);
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new("v".to_string(), vec![], Duration::ZERO);
        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
