//! Cache-wrapped read operations.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use super::MemeService;
use crate::cache::{CacheTag, TtlClass};
use crate::domain::{
    normalize_label, normalize_labels, Category, Comment, Meme, MemeView, Notification,
    PageRequest, SearchQuery, SortMode, SystemStatus, TagCount, TimeRange, UserProfile,
};
use crate::error::{AppError, Result};

/// Tags every meme on a page so that per-meme mutations evict the page too.
fn page_tags(memes: &Vec<Meme>) -> Vec<CacheTag> {
    memes.iter().map(|meme| CacheTag::meme(meme.id)).collect()
}

#[derive(Serialize)]
struct HotArgs {
    page: PageRequest,
    sort: SortMode,
    range: TimeRange,
}

#[derive(Serialize)]
struct SearchArgs<'a> {
    query: &'a SearchQuery,
    page: PageRequest,
    sort: SortMode,
}

impl MemeService {
    pub async fn get_recent_memes(&self, page: PageRequest) -> Result<Vec<Meme>> {
        let store = &self.store;
        self.cache
            .get_or_compute_tagged(
                "getRecentMemes",
                &page,
                vec![CacheTag::memes()],
                TtlClass::Default,
                || async move { store.recent_memes(page).await.map_err(AppError::from) },
                page_tags,
            )
            .await
    }

    pub async fn get_hot_memes(
        &self,
        page: PageRequest,
        sort: SortMode,
        range: TimeRange,
    ) -> Result<Vec<Meme>> {
        let store = &self.store;
        let args = HotArgs { page, sort, range };
        self.cache
            .get_or_compute_tagged(
                "getHotMemes",
                &args,
                vec![CacheTag::memes()],
                TtlClass::Short,
                || async move {
                    store
                        .hot_memes(page, sort, range)
                        .await
                        .map_err(AppError::from)
                },
                page_tags,
            )
            .await
    }

    /// Searches by title, tags and category. A query with no usable
    /// criterion returns an empty page without touching the store.
    pub async fn search_memes(
        &self,
        query: SearchQuery,
        page: PageRequest,
        sort: SortMode,
    ) -> Result<Vec<Meme>> {
        let query = SearchQuery {
            query: query
                .query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            tags: normalize_labels(&query.tags),
            category: query.category.as_deref().and_then(normalize_label),
        };
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let store = &self.store;
        let query = &query;
        let args = SearchArgs { query, page, sort };
        self.cache
            .get_or_compute_tagged(
                "searchMemes",
                &args,
                vec![CacheTag::memes()],
                TtlClass::Short,
                || async move {
                    store
                        .search_memes(query, page, sort)
                        .await
                        .map_err(AppError::from)
                },
                page_tags,
            )
            .await
    }

    /// Returns `None` for an unknown meme.
    pub async fn get_meme(&self, id: Uuid) -> Result<Option<Meme>> {
        let store = &self.store;
        self.cache
            .get_or_compute(
                "getMeme",
                &id,
                vec![CacheTag::meme(id)],
                TtlClass::Default,
                || async move { store.meme(id).await.map_err(AppError::from) },
            )
            .await
    }

    pub async fn get_meme_comments(&self, meme_id: Uuid) -> Result<Vec<Comment>> {
        let store = &self.store;
        self.cache
            .get_or_compute(
                "getMemeComments",
                &meme_id,
                vec![CacheTag::comments(), CacheTag::meme(meme_id)],
                TtlClass::Default,
                || async move { store.meme_comments(meme_id).await.map_err(AppError::from) },
            )
            .await
    }

    /// Returns `None` for an unknown user.
    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let store = &self.store;
        self.cache
            .get_or_compute(
                "getUserProfile",
                user_id,
                vec![
                    CacheTag::users(),
                    CacheTag::user(user_id),
                    CacheTag::user_memes(user_id),
                ],
                TtlClass::Default,
                || async move { store.user_profile(user_id).await.map_err(AppError::from) },
            )
            .await
    }

    pub async fn get_user_memes(&self, user_id: &str, page: PageRequest) -> Result<Vec<Meme>> {
        let store = &self.store;
        self.cache
            .get_or_compute_tagged(
                "getUserMemes",
                &(user_id, page),
                vec![CacheTag::memes(), CacheTag::user_memes(user_id)],
                TtlClass::Short,
                || async move {
                    store
                        .user_memes(user_id, page)
                        .await
                        .map_err(AppError::from)
                },
                page_tags,
            )
            .await
    }

    /// Returns which of `meme_ids` the user has liked.
    ///
    /// Ids are deduplicated and sorted before keying, so any ordering of the
    /// same set shares one entry. An empty list never reaches the store or
    /// the cache.
    pub async fn get_user_likes(&self, user_id: &str, meme_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = meme_ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let store = &self.store;
        let ids = &ids;
        self.cache
            .get_or_compute(
                "getUserLikes",
                &(user_id, ids),
                vec![CacheTag::likes(), CacheTag::user_likes(user_id)],
                TtlClass::Short,
                || async move {
                    store
                        .liked_meme_ids(user_id, ids)
                        .await
                        .map_err(AppError::from)
                },
            )
            .await
    }

    pub async fn get_popular_tags(&self) -> Result<Vec<TagCount>> {
        let store = &self.store;
        let limit = self.popular_tags_limit;
        self.cache
            .get_or_compute(
                "getPopularTags",
                &limit,
                vec![CacheTag::tags()],
                TtlClass::Long,
                || async move { store.popular_tags(limit).await.map_err(AppError::from) },
            )
            .await
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let store = &self.store;
        self.cache
            .get_or_compute(
                "getAllCategories",
                &(),
                vec![CacheTag::categories()],
                TtlClass::Long,
                || async move { store.categories().await.map_err(AppError::from) },
            )
            .await
    }

    pub async fn get_system_status(&self) -> Result<SystemStatus> {
        let store = &self.store;
        self.cache
            .get_or_compute(
                "getSystemStatus",
                &(),
                vec![CacheTag::system()],
                TtlClass::Default,
                || async move { store.system_status().await.map_err(AppError::from) },
            )
            .await
    }

    /// Notifications addressed to `user_id`, newest first. Not cached.
    pub async fn get_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.authenticate(user_id).await?;
        Ok(self.store.notifications(user_id).await?)
    }

    /// Pairs each meme with whether `viewer` has liked it.
    pub async fn annotate(&self, viewer: Option<&str>, memes: Vec<Meme>) -> Result<Vec<MemeView>> {
        let liked: HashSet<Uuid> = match viewer {
            Some(user_id) => {
                let ids: Vec<Uuid> = memes.iter().map(|meme| meme.id).collect();
                self.get_user_likes(user_id, &ids).await?.into_iter().collect()
            }
            None => HashSet::new(),
        };
        Ok(memes
            .into_iter()
            .map(|meme| {
                let is_liked = liked.contains(&meme.id);
                MemeView::new(meme, is_liked)
            })
            .collect())
    }
}
