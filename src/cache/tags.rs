//! Cache Tags
//!
//! Tags name invalidation scopes. Collection tags cover a whole table's worth
//! of reads; parameterized tags are built from an entity id, so a mutation can
//! rebuild them from the ids it already holds. A parameterized tag is
//! `<kind>:<id>`; kinds never contain `:`, so the first colon splits it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An invalidation scope attached to cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTag(String);

impl CacheTag {
    /// Wraps an arbitrary tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    // == Collection tags ==

    pub fn memes() -> Self {
        Self::new("memes")
    }

    pub fn users() -> Self {
        Self::new("users")
    }

    pub fn categories() -> Self {
        Self::new("categories")
    }

    pub fn tags() -> Self {
        Self::new("tags")
    }

    pub fn likes() -> Self {
        Self::new("likes")
    }

    pub fn comments() -> Self {
        Self::new("comments")
    }

    pub fn system() -> Self {
        Self::new("system")
    }

    // == Parameterized tags ==

    /// Scope of a single meme: its detail view and every page that lists it.
    pub fn meme(id: Uuid) -> Self {
        Self(format!("meme:{id}"))
    }

    pub fn user(user_id: &str) -> Self {
        Self(format!("user:{user_id}"))
    }

    /// Scope of like lookups performed on behalf of one user.
    pub fn user_likes(user_id: &str) -> Self {
        Self(format!("user-likes:{user_id}"))
    }

    /// Scope of one user's uploads and the counters derived from them.
    pub fn user_memes(user_id: &str) -> Self {
        Self(format!("user-memes:{user_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
