//! Response DTOs for the meme API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use uuid::Uuid;

use crate::cache::CacheStats;
use crate::domain::{LikeToggle, MemeView, PageRequest};

/// A page of memes annotated for the viewer
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub memes: Vec<MemeView>,
    pub offset: usize,
    pub limit: usize,
}

impl FeedResponse {
    pub fn new(memes: Vec<MemeView>, page: PageRequest) -> Self {
        Self {
            memes,
            offset: page.offset,
            limit: page.limit,
        }
    }

    /// The page served when the store could not be read.
    pub fn empty(page: PageRequest) -> Self {
        Self::new(Vec::new(), page)
    }
}

/// Response body for POST /memes/:id/like
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub meme_id: Uuid,
    pub liked: bool,
    pub likes_count: u64,
}

impl LikeResponse {
    pub fn new(meme_id: Uuid, toggle: &LikeToggle) -> Self {
        Self {
            meme_id,
            liked: toggle.liked,
            likes_count: toggle.likes_count,
        }
    }
}

/// Response body for GET /users/:id/likes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesResponse {
    pub user_id: String,
    pub liked: Vec<Uuid>,
}

/// Response body for DELETE /memes/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The meme that was deleted
    pub id: Uuid,
}

impl DeleteResponse {
    pub fn new(id: Uuid) -> Self {
        Self {
            message: format!("Meme '{}' deleted successfully", id),
            id,
        }
    }
}

/// Response body for POST /cache/invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub tags: Vec<String>,
    /// Number of cache entries evicted
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Computed values written to the cache
    pub stores: u64,
    /// Computed values discarded because a tag was invalidated meanwhile
    pub skipped_stores: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Entries removed by tag invalidation
    pub invalidated: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            stores: stats.stores,
            skipped_stores: stats.skipped_stores,
            evictions: stats.evictions,
            invalidated: stats.invalidated,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
