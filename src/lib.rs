//! Memeboard - A meme sharing backend
//!
//! Serves feeds, profiles and engagement over HTTP through a tag-addressable
//! read-through cache that mutations invalidate before they respond.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod invalidation;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::TagCache;
pub use config::Config;
pub use service::MemeService;
pub use store::{InMemoryStore, MemeStore};
pub use tasks::spawn_cleanup_task;
