//! Meme Service
//!
//! The read and write contracts the application layer consumes. Reads go
//! through the tag cache; writes commit to the entity store, then apply their
//! invalidation fan-out before returning.

mod engagement;
mod reads;
mod writes;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::cache::TagCache;
use crate::config::Config;
use crate::domain::User;
use crate::error::{AppError, Result};
use crate::invalidation::InvalidationCoordinator;
use crate::store::MemeStore;

#[derive(Clone)]
pub struct MemeService {
    store: Arc<dyn MemeStore>,
    cache: TagCache,
    invalidation: InvalidationCoordinator,
    media_base_url: String,
    popular_tags_limit: usize,
}

impl MemeService {
    pub fn new(store: Arc<dyn MemeStore>, cache: TagCache) -> Self {
        let defaults = Config::default();
        Self {
            store,
            invalidation: InvalidationCoordinator::new(cache.clone()),
            cache,
            media_base_url: defaults.media_base_url,
            popular_tags_limit: defaults.popular_tags_limit,
        }
    }

    /// Builds the service with a fresh cache sized and timed from `config`.
    pub fn from_config(config: &Config, store: Arc<dyn MemeStore>) -> Self {
        let cache = TagCache::new(config.max_entries, config.ttl_policy());
        Self {
            media_base_url: config.media_base_url.clone(),
            popular_tags_limit: config.popular_tags_limit,
            ..Self::new(store, cache)
        }
    }

    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    pub fn invalidation(&self) -> &InvalidationCoordinator {
        &self.invalidation
    }

    /// Resolves an identity to a user. Unknown identities are unauthorized.
    pub async fn authenticate(&self, user_id: &str) -> Result<User> {
        self.store
            .user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("unknown user {user_id}")))
    }
}
