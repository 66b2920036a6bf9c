//! In-memory implementation of the entity store.
//!
//! All tables live in one [`State`] guarded by a single `tokio::sync::RwLock`.
//! Reads take the read guard; each mutation takes the write guard for its
//! whole check-and-update sequence, which makes every mutation serializable
//! with respect to every other. State is lost on restart.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MemeStore, StoreError, StoreResult};
use crate::domain::{
    sort_memes, Category, Comment, EngagementScore, HotScorer, LikeToggle, Meme, NewMeme, NewUser,
    Notification, NotificationKind, Owner, PageRequest, ProfileUpdate, SearchQuery, SortMode,
    SystemStatus, TagCount, TimeRange, UploadedMeme, User, UserProfile,
};

#[derive(Debug, Clone)]
struct MemeRow {
    /// Insertion order, newest has the highest value
    seq: u64,
    id: Uuid,
    owner_id: String,
    image_url: String,
    title: String,
    category: Option<String>,
    tags: Vec<String>,
    likes_count: u64,
    comments_count: u64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: Uuid,
    meme_id: Uuid,
    user_id: String,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct NotificationRow {
    id: Uuid,
    recipient_id: String,
    actor_id: String,
    meme_id: Uuid,
    kind: NotificationKind,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    next_seq: u64,
    users: HashMap<String, User>,
    memes: HashMap<Uuid, MemeRow>,
    likes: HashSet<(String, Uuid)>,
    comments: Vec<CommentRow>,
    notifications: Vec<NotificationRow>,
    tags: BTreeSet<String>,
    categories: BTreeSet<String>,
}

impl State {
    fn owner(&self, user_id: &str) -> Owner {
        match self.users.get(user_id) {
            Some(user) => user.owner(),
            None => Owner {
                id: user_id.to_string(),
                name: user_id.to_string(),
                image: None,
            },
        }
    }

    fn project(&self, row: &MemeRow) -> Meme {
        Meme {
            id: row.id,
            image_url: row.image_url.clone(),
            title: row.title.clone(),
            category: row.category.clone(),
            tags: row.tags.clone(),
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            created_at: row.created_at,
            owner: self.owner(&row.owner_id),
        }
    }

    /// Projects the rows accepted by `filter`, ordered for `sort`. Rows are
    /// pre-ordered newest insert first so equal keys keep that order.
    fn select(
        &self,
        filter: impl Fn(&MemeRow) -> bool,
        sort: SortMode,
        scorer: &dyn HotScorer,
    ) -> Vec<Meme> {
        let mut rows: Vec<&MemeRow> = self.memes.values().filter(|row| filter(*row)).collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        let mut memes: Vec<Meme> = rows.into_iter().map(|row| self.project(row)).collect();
        sort_memes(&mut memes, sort, scorer);
        memes
    }

    fn require_user(&self, user_id: &str) -> StoreResult<()> {
        if self.users.contains_key(user_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("user {user_id}")))
        }
    }

    fn notify(&mut self, recipient_id: &str, actor_id: &str, meme_id: Uuid, kind: NotificationKind) {
        if recipient_id == actor_id {
            return;
        }
        self.notifications.push(NotificationRow {
            id: Uuid::new_v4(),
            recipient_id: recipient_id.to_string(),
            actor_id: actor_id.to_string(),
            meme_id,
            kind,
            created_at: Utc::now(),
        });
    }
}

pub struct InMemoryStore {
    state: RwLock<State>,
    scorer: Arc<dyn HotScorer>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_scorer(Arc::new(EngagementScore))
    }

    /// Creates a store that ranks the hot feed with `scorer`.
    pub fn with_scorer(scorer: Arc<dyn HotScorer>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            scorer,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemeStore for InMemoryStore {
    async fn recent_memes(&self, page: PageRequest) -> StoreResult<Vec<Meme>> {
        let state = self.state.read().await;
        let memes = state.select(|_| true, SortMode::Recent, self.scorer.as_ref());
        Ok(page.slice(memes))
    }

    async fn hot_memes(
        &self,
        page: PageRequest,
        sort: SortMode,
        range: TimeRange,
    ) -> StoreResult<Vec<Meme>> {
        let since = range.since(Utc::now());
        let state = self.state.read().await;
        let memes = state.select(
            |row| since.map_or(true, |since| row.created_at >= since),
            sort,
            self.scorer.as_ref(),
        );
        Ok(page.slice(memes))
    }

    async fn search_memes(
        &self,
        query: &SearchQuery,
        page: PageRequest,
        sort: SortMode,
    ) -> StoreResult<Vec<Meme>> {
        let state = self.state.read().await;
        let memes: Vec<Meme> = state
            .select(|_| true, sort, self.scorer.as_ref())
            .into_iter()
            .filter(|meme| query.matches(meme))
            .collect();
        Ok(page.slice(memes))
    }

    async fn meme(&self, id: Uuid) -> StoreResult<Option<Meme>> {
        let state = self.state.read().await;
        Ok(state.memes.get(&id).map(|row| state.project(row)))
    }

    async fn meme_comments(&self, meme_id: Uuid) -> StoreResult<Vec<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.meme_id == meme_id)
            .map(|c| Comment {
                id: c.id,
                meme_id: c.meme_id,
                author: state.owner(&c.user_id),
                content: c.content.clone(),
                created_at: c.created_at,
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn user(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn user_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let state = self.state.read().await;
        let Some(user) = state.users.get(user_id) else {
            return Ok(None);
        };
        let owned = state.memes.values().filter(|row| row.owner_id == user_id);
        let (memes_count, total_likes) =
            owned.fold((0u64, 0u64), |(count, likes), row| (count + 1, likes + row.likes_count));
        Ok(Some(UserProfile {
            user: user.clone(),
            memes_count,
            total_likes,
        }))
    }

    async fn user_memes(&self, user_id: &str, page: PageRequest) -> StoreResult<Vec<Meme>> {
        let state = self.state.read().await;
        let memes = state.select(
            |row| row.owner_id == user_id,
            SortMode::Recent,
            self.scorer.as_ref(),
        );
        Ok(page.slice(memes))
    }

    async fn liked_meme_ids(&self, user_id: &str, meme_ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(meme_ids
            .iter()
            .copied()
            .filter(|id| state.likes.contains(&(user_id.to_string(), *id)))
            .collect())
    }

    async fn popular_tags(&self, limit: usize) -> StoreResult<Vec<TagCount>> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for tag in state.memes.values().flat_map(|row| row.tags.iter()) {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(name, count)| TagCount {
                name: name.to_string(),
                count,
            })
            .collect();
        // BTreeMap iteration already orders names; the stable sort keeps it for ties.
        tags.sort_by(|a, b| b.count.cmp(&a.count));
        tags.truncate(limit);
        Ok(tags)
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .iter()
            .map(|name| Category {
                name: name.clone(),
                memes_count: state
                    .memes
                    .values()
                    .filter(|row| row.category.as_deref() == Some(name.as_str()))
                    .count() as u64,
            })
            .collect())
    }

    async fn system_status(&self) -> StoreResult<SystemStatus> {
        let state = self.state.read().await;
        Ok(SystemStatus {
            users: state.users.len() as u64,
            memes: state.memes.len() as u64,
            likes: state.likes.len() as u64,
            comments: state.comments.len() as u64,
            tags: state.tags.len() as u64,
            categories: state.categories.len() as u64,
            generated_at: Utc::now(),
        })
    }

    async fn notifications(&self, user_id: &str) -> StoreResult<Vec<Notification>> {
        let state = self.state.read().await;
        let mut notifications: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == user_id)
            .map(|n| Notification {
                id: n.id,
                recipient_id: n.recipient_id.clone(),
                actor: state.owner(&n.actor_id),
                meme_id: n.meme_id,
                kind: n.kind,
                created_at: n.created_at,
            })
            .collect();
        notifications.reverse();
        Ok(notifications)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
        }
        let record = User {
            id: user.id.clone(),
            name: user.name,
            bio: None,
            image: user.image,
            socials: Default::default(),
            category: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, record.clone());
        Ok(record)
    }

    async fn update_user(&self, user_id: &str, update: ProfileUpdate) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        update.apply(user);
        Ok(user.clone())
    }

    async fn toggle_like(&self, user_id: &str, meme_id: Uuid) -> StoreResult<LikeToggle> {
        let mut state = self.state.write().await;
        state.require_user(user_id)?;
        if !state.memes.contains_key(&meme_id) {
            return Err(StoreError::NotFound(format!("meme {meme_id}")));
        }

        let like = (user_id.to_string(), meme_id);
        let liked = !state.likes.remove(&like);
        if liked {
            state.likes.insert(like);
        }

        let row = state
            .memes
            .get_mut(&meme_id)
            .ok_or_else(|| StoreError::NotFound(format!("meme {meme_id}")))?;
        row.likes_count = if liked {
            row.likes_count.saturating_add(1)
        } else {
            row.likes_count.saturating_sub(1)
        };
        let toggle = LikeToggle {
            liked,
            likes_count: row.likes_count,
            owner_id: row.owner_id.clone(),
        };

        if liked {
            let owner_id = toggle.owner_id.clone();
            state.notify(&owner_id, user_id, meme_id, NotificationKind::Like);
        }
        Ok(toggle)
    }

    async fn add_comment(
        &self,
        meme_id: Uuid,
        user_id: &str,
        content: &str,
    ) -> StoreResult<Comment> {
        let mut state = self.state.write().await;
        state.require_user(user_id)?;
        let row = state
            .memes
            .get_mut(&meme_id)
            .ok_or_else(|| StoreError::NotFound(format!("meme {meme_id}")))?;
        row.comments_count = row.comments_count.saturating_add(1);
        let owner_id = row.owner_id.clone();

        let comment = CommentRow {
            id: Uuid::new_v4(),
            meme_id,
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        state.notify(&owner_id, user_id, meme_id, NotificationKind::Comment);

        Ok(Comment {
            id: comment.id,
            meme_id,
            author: state.owner(user_id),
            content: comment.content,
            created_at: comment.created_at,
        })
    }

    async fn insert_meme(&self, meme: NewMeme) -> StoreResult<UploadedMeme> {
        let mut state = self.state.write().await;
        state.require_user(&meme.owner_id)?;

        let mut created_tags = false;
        for tag in &meme.tags {
            created_tags |= state.tags.insert(tag.clone());
        }
        let created_category = match &meme.category {
            Some(category) => state.categories.insert(category.clone()),
            None => false,
        };

        let seq = state.next_seq;
        state.next_seq += 1;
        let row = MemeRow {
            seq,
            id: Uuid::new_v4(),
            owner_id: meme.owner_id,
            image_url: meme.image_url,
            title: meme.title,
            category: meme.category,
            tags: meme.tags,
            likes_count: 0,
            comments_count: 0,
            created_at: Utc::now(),
        };
        let projected = state.project(&row);
        state.memes.insert(row.id, row);

        Ok(UploadedMeme {
            meme: projected,
            created_tags,
            created_category,
        })
    }

    async fn delete_meme(&self, meme_id: Uuid) -> StoreResult<Meme> {
        let mut state = self.state.write().await;
        let row = state
            .memes
            .remove(&meme_id)
            .ok_or_else(|| StoreError::NotFound(format!("meme {meme_id}")))?;
        state.likes.retain(|(_, liked)| *liked != meme_id);
        state.comments.retain(|c| c.meme_id != meme_id);
        state.notifications.retain(|n| n.meme_id != meme_id);
        Ok(state.project(&row))
    }
}
