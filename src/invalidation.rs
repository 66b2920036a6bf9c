//! Invalidation Coordinator
//!
//! Maps each committed mutation to the cache tags it makes stale and evicts
//! them. Callers apply a mutation only after the store has committed it and
//! before they answer the request.

use tracing::info;
use uuid::Uuid;

use crate::cache::{CacheTag, TagCache};

/// A committed write, described by the ids needed to rebuild its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A like was added or removed.
    LikeToggled {
        user_id: String,
        meme_id: Uuid,
        owner_id: String,
    },
    CommentAdded { meme_id: Uuid },
    /// `categorized` is set when the meme names a category, new or not.
    MemeUploaded {
        owner_id: String,
        created_tags: bool,
        categorized: bool,
    },
    MemeDeleted {
        meme_id: Uuid,
        owner_id: String,
        categorized: bool,
    },
    ProfileUpdated { user_id: String },
    UserRegistered { user_id: String },
}

impl Mutation {
    /// The invalidation fan-out of this mutation.
    pub fn tags(&self) -> Vec<CacheTag> {
        match self {
            Mutation::LikeToggled {
                user_id,
                meme_id,
                owner_id,
            } => vec![
                CacheTag::meme(*meme_id),
                CacheTag::memes(),
                CacheTag::user_likes(user_id),
                CacheTag::user_memes(owner_id),
            ],
            Mutation::CommentAdded { meme_id } => {
                vec![CacheTag::meme(*meme_id), CacheTag::comments()]
            }
            Mutation::MemeUploaded {
                owner_id,
                created_tags,
                categorized,
            } => {
                let mut tags = vec![
                    CacheTag::memes(),
                    CacheTag::user_memes(owner_id),
                    CacheTag::system(),
                ];
                if *created_tags {
                    tags.push(CacheTag::tags());
                }
                // Category rows carry a per-category meme count.
                if *categorized {
                    tags.push(CacheTag::categories());
                }
                tags
            }
            Mutation::MemeDeleted {
                meme_id,
                owner_id,
                categorized,
            } => {
                let mut tags = vec![
                    CacheTag::meme(*meme_id),
                    CacheTag::memes(),
                    CacheTag::comments(),
                    CacheTag::user_memes(owner_id),
                    CacheTag::system(),
                ];
                if *categorized {
                    tags.push(CacheTag::categories());
                }
                tags
            }
            Mutation::ProfileUpdated { user_id } => vec![CacheTag::user(user_id)],
            Mutation::UserRegistered { user_id } => vec![
                CacheTag::user(user_id),
                CacheTag::users(),
                CacheTag::system(),
            ],
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Mutation::LikeToggled { .. } => "like_toggled",
            Mutation::CommentAdded { .. } => "comment_added",
            Mutation::MemeUploaded { .. } => "meme_uploaded",
            Mutation::MemeDeleted { .. } => "meme_deleted",
            Mutation::ProfileUpdated { .. } => "profile_updated",
            Mutation::UserRegistered { .. } => "user_registered",
        }
    }
}

/// Applies mutation fan-outs to a [`TagCache`].
#[derive(Clone, Debug)]
pub struct InvalidationCoordinator {
    cache: TagCache,
}

impl InvalidationCoordinator {
    pub fn new(cache: TagCache) -> Self {
        Self { cache }
    }

    /// Evicts everything `mutation` made stale. Returns the number of entries removed.
    pub async fn apply(&self, mutation: &Mutation) -> usize {
        let tags = mutation.tags();
        let removed = self.cache.invalidate(&tags).await;
        info!(mutation = mutation.name(), removed, "mutation invalidated cache");
        removed
    }

    /// Evicts an explicit tag list.
    pub async fn invalidate(&self, tags: &[CacheTag]) -> usize {
        self.cache.invalidate(tags).await
    }
}
