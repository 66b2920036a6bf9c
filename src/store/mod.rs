//! Entity Store
//!
//! The relational source of truth behind the cache. [`MemeStore`] is the seam
//! the service depends on; [`InMemoryStore`] is the process-local backend.
//!
//! Every mutation is one atomic unit: the row change, the denormalized
//! counter update and any notification it produces commit together or not at
//! all.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Category, Comment, LikeToggle, Meme, NewMeme, NewUser, Notification, PageRequest,
    ProfileUpdate, SearchQuery, SortMode, SystemStatus, TagCount, TimeRange, UploadedMeme, User,
    UserProfile,
};

pub mod memory;

pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MemeStore: Send + Sync {
    // == Reads ==
    async fn recent_memes(&self, page: PageRequest) -> StoreResult<Vec<Meme>>;
    async fn hot_memes(
        &self,
        page: PageRequest,
        sort: SortMode,
        range: TimeRange,
    ) -> StoreResult<Vec<Meme>>;
    async fn search_memes(
        &self,
        query: &SearchQuery,
        page: PageRequest,
        sort: SortMode,
    ) -> StoreResult<Vec<Meme>>;
    async fn meme(&self, id: Uuid) -> StoreResult<Option<Meme>>;
    async fn meme_comments(&self, meme_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn user(&self, user_id: &str) -> StoreResult<Option<User>>;
    async fn user_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;
    async fn user_memes(&self, user_id: &str, page: PageRequest) -> StoreResult<Vec<Meme>>;
    /// The subset of `meme_ids` that `user_id` has liked.
    async fn liked_meme_ids(&self, user_id: &str, meme_ids: &[Uuid]) -> StoreResult<Vec<Uuid>>;
    async fn popular_tags(&self, limit: usize) -> StoreResult<Vec<TagCount>>;
    async fn categories(&self) -> StoreResult<Vec<Category>>;
    async fn system_status(&self) -> StoreResult<SystemStatus>;
    async fn notifications(&self, user_id: &str) -> StoreResult<Vec<Notification>>;

    // == Mutations ==
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user(&self, user_id: &str, update: ProfileUpdate) -> StoreResult<User>;
    /// Flips the like state of `(user_id, meme_id)` and adjusts the meme's
    /// like counter, never below zero.
    async fn toggle_like(&self, user_id: &str, meme_id: Uuid) -> StoreResult<LikeToggle>;
    async fn add_comment(&self, meme_id: Uuid, user_id: &str, content: &str)
        -> StoreResult<Comment>;
    /// Inserts a meme, creating any tags or category it names that do not exist.
    async fn insert_meme(&self, meme: NewMeme) -> StoreResult<UploadedMeme>;
    /// Deletes a meme with its likes, comments and notifications.
    async fn delete_meme(&self, meme_id: Uuid) -> StoreResult<Meme>;
}
