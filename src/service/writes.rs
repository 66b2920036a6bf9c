//! Uploads, deletions and user records.

use uuid::Uuid;

use super::MemeService;
use crate::domain::meme::{MAX_LABEL_LENGTH, MAX_TAGS_PER_MEME, MAX_TITLE_LENGTH};
use crate::domain::user::{MAX_BIO_LENGTH, MAX_NAME_LENGTH};
use crate::domain::{
    normalize_label, normalize_labels, Meme, MemeUpload, NewMeme, NewUser, ProfileUpdate, User,
};
use crate::error::{AppError, Result};
use crate::invalidation::Mutation;

const RESERVED_USER_ID: &str = "me";

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("name cannot be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_labels(raw: &[String]) -> Result<Vec<String>> {
    let labels = normalize_labels(raw);
    if labels.len() > MAX_TAGS_PER_MEME {
        return Err(AppError::InvalidRequest(format!(
            "at most {MAX_TAGS_PER_MEME} tags are allowed"
        )));
    }
    if let Some(long) = labels.iter().find(|l| l.chars().count() > MAX_LABEL_LENGTH) {
        return Err(AppError::InvalidRequest(format!(
            "tag {long} exceeds {MAX_LABEL_LENGTH} characters"
        )));
    }
    Ok(labels)
}

fn validate_category(raw: Option<&str>) -> Result<Option<String>> {
    match raw.and_then(normalize_label) {
        Some(category) if category.chars().count() > MAX_LABEL_LENGTH => Err(
            AppError::InvalidRequest(format!("category exceeds {MAX_LABEL_LENGTH} characters")),
        ),
        category => Ok(category),
    }
}

/// Joins an object-storage key onto the media base URL.
fn media_url(base: &str, key: &str) -> Result<String> {
    let key = key.trim().trim_start_matches('/');
    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return Err(AppError::InvalidRequest(format!("invalid image key: {key:?}")));
    }
    Ok(format!("{}/{}", base.trim_end_matches('/'), key))
}

impl MemeService {
    /// Provisions the user record for a newly signed-in identity.
    pub async fn register_user(&self, user: NewUser) -> Result<User> {
        let id = user.id.trim().to_string();
        if id.is_empty() {
            return Err(AppError::InvalidRequest("user id cannot be empty".into()));
        }
        // Shadowed by the `/users/me` route.
        if id == RESERVED_USER_ID {
            return Err(AppError::InvalidRequest(format!("user id {id:?} is reserved")));
        }
        let record = self
            .store
            .create_user(NewUser {
                id,
                name: validate_name(&user.name)?,
                image: user.image.filter(|i| !i.trim().is_empty()),
            })
            .await?;

        self.invalidation
            .apply(&Mutation::UserRegistered {
                user_id: record.id.clone(),
            })
            .await;
        Ok(record)
    }

    pub async fn upload_meme(&self, user_id: &str, upload: MemeUpload) -> Result<Meme> {
        let owner = self.authenticate(user_id).await?;

        let title = upload.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidRequest("title cannot be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(AppError::InvalidRequest(format!(
                "title exceeds {MAX_TITLE_LENGTH} characters"
            )));
        }
        let new_meme = NewMeme {
            owner_id: owner.id,
            image_url: media_url(&self.media_base_url, &upload.image_key)?,
            title: title.to_string(),
            category: validate_category(upload.category.as_deref())?,
            tags: validate_labels(&upload.tags)?,
        };

        let uploaded = self.store.insert_meme(new_meme).await?;
        self.invalidation
            .apply(&Mutation::MemeUploaded {
                owner_id: uploaded.meme.owner.id.clone(),
                created_tags: uploaded.created_tags,
                categorized: uploaded.meme.category.is_some(),
            })
            .await;
        Ok(uploaded.meme)
    }

    /// Deletes a meme owned by `user_id`.
    pub async fn delete_meme(&self, user_id: &str, meme_id: Uuid) -> Result<Meme> {
        let user = self.authenticate(user_id).await?;
        let meme = self
            .store
            .meme(meme_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("meme {meme_id}")))?;
        if meme.owner.id != user.id {
            return Err(AppError::Unauthorized(format!(
                "meme {meme_id} is not owned by {}",
                user.id
            )));
        }

        let deleted = self.store.delete_meme(meme_id).await?;
        self.invalidation
            .apply(&Mutation::MemeDeleted {
                meme_id,
                owner_id: deleted.owner.id.clone(),
                categorized: deleted.category.is_some(),
            })
            .await;
        Ok(deleted)
    }

    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User> {
        let user = self.authenticate(user_id).await?;
        if update.is_empty() {
            return Ok(user);
        }
        if let Some(bio) = &update.bio {
            if bio.chars().count() > MAX_BIO_LENGTH {
                return Err(AppError::InvalidRequest(format!(
                    "bio exceeds {MAX_BIO_LENGTH} characters"
                )));
            }
        }
        let update = ProfileUpdate {
            name: update.name.as_deref().map(validate_name).transpose()?,
            category: match update.category.as_deref() {
                Some(raw) => Some(validate_category(Some(raw))?.unwrap_or_default()),
                None => None,
            },
            tags: update.tags.as_deref().map(validate_labels).transpose()?,
            ..update
        };

        let updated = self.store.update_user(&user.id, update).await?;
        self.invalidation
            .apply(&Mutation::ProfileUpdated {
                user_id: updated.id.clone(),
            })
            .await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_joins_base_and_key() {
        assert_eq!(media_url("/media/", "/a/b.png").unwrap(), "/media/a/b.png");
        assert_eq!(
            media_url("https://cdn.example.com", "x.gif").unwrap(),
            "https://cdn.example.com/x.gif"
        );
    }

    #[test]
    fn media_url_rejects_traversal_and_empty_keys() {
        assert!(media_url("/media", "").is_err());
        assert!(media_url("/media", "  / ").is_err());
        assert!(media_url("/media", "../secret").is_err());
        assert!(media_url("/media", "a/../../b").is_err());
    }

    #[test]
    fn labels_are_normalized_and_bounded() {
        let raw: Vec<String> = ["React", "react", "Dank Memes"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(validate_labels(&raw).unwrap(), vec!["react", "dank-memes"]);

        let many: Vec<String> = (0..11).map(|i| format!("t{i}")).collect();
        assert!(validate_labels(&many).is_err());
        assert!(validate_labels(&["x".repeat(33)]).is_err());
    }

    #[test]
    fn category_blank_is_none() {
        assert_eq!(validate_category(Some("  ")).unwrap(), None);
        assert_eq!(validate_category(Some("Funny")).unwrap(), Some("funny".into()));
        assert!(validate_category(Some(&"c".repeat(40))).is_err());
    }
}
