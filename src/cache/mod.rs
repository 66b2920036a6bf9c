//! Cache Module
//!
//! Tag-addressable read-through cache with TTL classes, LRU capacity control
//! and bulk invalidation by tag.

mod entry;
mod error;
mod key;
mod layer;
mod lru;
mod stats;
mod store;
mod tags;
mod ttl;


// Re-export public types
pub use entry::CacheEntry;
pub use error::CacheError;
pub use key::CacheKey;
pub use layer::TagCache;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, Epoch, InsertOutcome};
pub use tags::CacheTag;
pub use ttl::{TtlClass, TtlPolicy};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed serialized value size in bytes
pub const MAX_VALUE_SIZE: usize = 4 * 1024 * 1024; // 4 MB
