//! Likes and comments.

use uuid::Uuid;

use super::MemeService;
use crate::domain::meme::MAX_COMMENT_LENGTH;
use crate::domain::{Comment, LikeToggle};
use crate::error::{AppError, Result};
use crate::invalidation::Mutation;

impl MemeService {
    /// Flips `user_id`'s like on `meme_id`.
    ///
    /// The store commits the like row, the counter and the owner's
    /// notification as one unit; the fan-out runs after that commit.
    pub async fn toggle_like(&self, user_id: &str, meme_id: Uuid) -> Result<LikeToggle> {
        let user = self.authenticate(user_id).await?;
        let toggle = self.store.toggle_like(&user.id, meme_id).await?;

        self.invalidation
            .apply(&Mutation::LikeToggled {
                user_id: user.id,
                meme_id,
                owner_id: toggle.owner_id.clone(),
            })
            .await;
        Ok(toggle)
    }

    pub async fn add_comment(&self, meme_id: Uuid, user_id: &str, content: &str) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidRequest("comment cannot be empty".into()));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::InvalidRequest(format!(
                "comment exceeds {MAX_COMMENT_LENGTH} characters"
            )));
        }

        let user = self.authenticate(user_id).await?;
        let comment = self.store.add_comment(meme_id, &user.id, content).await?;

        self.invalidation
            .apply(&Mutation::CommentAdded { meme_id })
            .await;
        Ok(comment)
    }
}
