//! Error types for the cache layer.

use thiserror::Error;

// == Cache Error Enum ==
#[derive(Error, Debug)]
pub enum CacheError {
    /// Operation name or derived key is unusable
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Serialized value is larger than a single entry may hold
    #[error("Value of {size} bytes exceeds maximum size of {limit} bytes")]
    ValueTooLarge { size: usize, limit: usize },

    /// Arguments or results could not be converted to or from JSON
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
