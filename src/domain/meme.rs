//! Meme, comment, like and notification projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;
/// Maximum number of tags on a single meme
pub const MAX_TAGS_PER_MEME: usize = 10;
/// Maximum comment length in characters
pub const MAX_COMMENT_LENGTH: usize = 1000;
/// Maximum tag or category name length in characters
pub const MAX_LABEL_LENGTH: usize = 32;

/// Public identity of the user who owns or acted on something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

/// Cached projection of a meme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meme {
    pub id: Uuid,
    pub image_url: String,
    pub title: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub created_at: DateTime<Utc>,
    pub owner: Owner,
}

/// A meme as shown to one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemeView {
    #[serde(flatten)]
    pub meme: Meme,
    pub is_liked: bool,
}

impl MemeView {
    pub fn new(meme: Meme, is_liked: bool) -> Self {
        Self { meme, is_liked }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub meme_id: Uuid,
    pub author: Owner,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Result of toggling a like, as committed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: u64,
    pub owner_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: String,
    pub actor: Owner,
    pub meme_id: Uuid,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

/// Upload form as submitted: the object-storage key of an already stored
/// image plus its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemeUpload {
    pub title: String,
    pub image_key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Validated input for a new meme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeme {
    pub owner_id: String,
    pub image_url: String,
    pub title: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// A stored meme plus whether storing it created new reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMeme {
    pub meme: Meme,
    pub created_tags: bool,
    pub created_category: bool,
}

/// Normalizes a tag or category name: trimmed, lower-cased, inner runs of
/// whitespace collapsed to a single dash. Empty names yield `None`.
pub fn normalize_label(raw: &str) -> Option<String> {
    let label = raw
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    (!label.is_empty()).then_some(label)
}

/// Normalizes and deduplicates a list of labels, keeping first-seen order.
pub fn normalize_labels<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut labels: Vec<String> = Vec::new();
    for label in raw.into_iter().filter_map(|s| normalize_label(s.as_ref())) {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}
