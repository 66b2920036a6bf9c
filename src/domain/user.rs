//! Users and their cached profile projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::meme::Owner;

/// Maximum display name length in characters
pub const MAX_NAME_LENGTH: usize = 64;
/// Maximum bio length in characters
pub const MAX_BIO_LENGTH: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socials {
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub socials: Socials,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn owner(&self) -> Owner {
        Owner {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// Cached profile: the user plus counters derived from their uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub memes_count: u64,
    pub total_likes: u64,
}

/// Input for provisioning a user record on first sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub socials: Option<Socials>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.image.is_none()
            && self.socials.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }

    /// Applies the present fields to `user`.
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio).filter(|b| !b.is_empty());
        }
        if let Some(image) = self.image {
            user.image = Some(image).filter(|i| !i.is_empty());
        }
        if let Some(socials) = self.socials {
            user.socials = socials;
        }
        if let Some(category) = self.category {
            user.category = Some(category).filter(|c| !c.is_empty());
        }
        if let Some(tags) = self.tags {
            user.tags = tags;
        }
    }
}
