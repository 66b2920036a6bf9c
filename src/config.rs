//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::TtlPolicy;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Lifetime of SHORT entries in seconds
    pub ttl_short: u64,
    /// Lifetime of DEFAULT entries in seconds
    pub ttl_default: u64,
    /// Lifetime of LONG entries in seconds
    pub ttl_long: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Prefix joined with an upload's image key to form its URL
    pub media_base_url: String,
    /// Number of tags returned by the popular tags read
    pub popular_tags_limit: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `TTL_SHORT_SECS` - SHORT class lifetime (default: 300)
    /// - `TTL_DEFAULT_SECS` - DEFAULT class lifetime (default: 3600)
    /// - `TTL_LONG_SECS` - LONG class lifetime (default: 86400)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 30)
    /// - `MEDIA_BASE_URL` - Image URL prefix (default: /media)
    /// - `POPULAR_TAGS_LIMIT` - Popular tags returned (default: 20)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            ttl_short: env_or("TTL_SHORT_SECS", defaults.ttl_short),
            ttl_default: env_or("TTL_DEFAULT_SECS", defaults.ttl_default),
            ttl_long: env_or("TTL_LONG_SECS", defaults.ttl_long),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            media_base_url: env::var("MEDIA_BASE_URL").unwrap_or(defaults.media_base_url),
            popular_tags_limit: env_or("POPULAR_TAGS_LIMIT", defaults.popular_tags_limit),
        }
    }

    /// TTL class durations.
    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy::new(
            Duration::from_secs(self.ttl_short),
            Duration::from_secs(self.ttl_default),
            Duration::from_secs(self.ttl_long),
        )
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl_short: 300,
            ttl_default: 3600,
            ttl_long: 86400,
            server_port: 3000,
            cleanup_interval: 30,
            media_base_url: "/media".to_string(),
            popular_tags_limit: 20,
        }
    }
}
