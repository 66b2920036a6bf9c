use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::MemeService;
use crate::cache::{CacheTag, TagCache};
use crate::domain::{
    Category, Comment, LikeToggle, Meme, MemeUpload, NewMeme, NewUser, Notification,
    NotificationKind, PageRequest, ProfileUpdate, SearchQuery, SortMode, SystemStatus, TagCount,
    TimeRange, UploadedMeme, User, UserProfile,
};
use crate::error::AppError;
use crate::store::{InMemoryStore, MemeStore, StoreError, StoreResult};

/// Wraps an [`InMemoryStore`], counting read calls and optionally failing
/// every call.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: InMemoryStore,
    reads: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn read(&self) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MemeStore for CountingStore {
    async fn recent_memes(&self, page: PageRequest) -> StoreResult<Vec<Meme>> {
        self.read()?;
        self.inner.recent_memes(page).await
    }
    async fn hot_memes(
        &self,
        page: PageRequest,
        sort: SortMode,
        range: TimeRange,
    ) -> StoreResult<Vec<Meme>> {
        self.read()?;
        self.inner.hot_memes(page, sort, range).await
    }
    async fn search_memes(
        &self,
        query: &SearchQuery,
        page: PageRequest,
        sort: SortMode,
    ) -> StoreResult<Vec<Meme>> {
        self.read()?;
        self.inner.search_memes(query, page, sort).await
    }
    async fn meme(&self, id: Uuid) -> StoreResult<Option<Meme>> {
        self.read()?;
        self.inner.meme(id).await
    }
    async fn meme_comments(&self, meme_id: Uuid) -> StoreResult<Vec<Comment>> {
        self.read()?;
        self.inner.meme_comments(meme_id).await
    }
    // Identity lookups are not counted; every write performs one.
    async fn user(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.check()?;
        self.inner.user(user_id).await
    }
    async fn user_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        self.read()?;
        self.inner.user_profile(user_id).await
    }
    async fn user_memes(&self, user_id: &str, page: PageRequest) -> StoreResult<Vec<Meme>> {
        self.read()?;
        self.inner.user_memes(user_id, page).await
    }
    async fn liked_meme_ids(&self, user_id: &str, meme_ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        self.read()?;
        self.inner.liked_meme_ids(user_id, meme_ids).await
    }
    async fn popular_tags(&self, limit: usize) -> StoreResult<Vec<TagCount>> {
        self.read()?;
        self.inner.popular_tags(limit).await
    }
    async fn categories(&self) -> StoreResult<Vec<Category>> {
        self.read()?;
        self.inner.categories().await
    }
    async fn system_status(&self) -> StoreResult<SystemStatus> {
        self.read()?;
        self.inner.system_status().await
    }
    async fn notifications(&self, user_id: &str) -> StoreResult<Vec<Notification>> {
        self.read()?;
        self.inner.notifications(user_id).await
    }
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.check()?;
        self.inner.create_user(user).await
    }
    async fn update_user(&self, user_id: &str, update: ProfileUpdate) -> StoreResult<User> {
        self.check()?;
        self.inner.update_user(user_id, update).await
    }
    async fn toggle_like(&self, user_id: &str, meme_id: Uuid) -> StoreResult<LikeToggle> {
        self.check()?;
        self.inner.toggle_like(user_id, meme_id).await
    }
    async fn add_comment(
        &self,
        meme_id: Uuid,
        user_id: &str,
        content: &str,
    ) -> StoreResult<Comment> {
        self.check()?;
        self.inner.add_comment(meme_id, user_id, content).await
    }
    async fn insert_meme(&self, meme: NewMeme) -> StoreResult<UploadedMeme> {
        self.check()?;
        self.inner.insert_meme(meme).await
    }
    async fn delete_meme(&self, meme_id: Uuid) -> StoreResult<Meme> {
        self.check()?;
        self.inner.delete_meme(meme_id).await
    }
}

pub(crate) async fn service_with_users(users: &[&str]) -> (MemeService, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let service = MemeService::new(store.clone(), TagCache::default());
    for id in users {
        service
            .register_user(NewUser {
                id: id.to_string(),
                name: id.to_uppercase(),
                image: None,
            })
            .await
            .unwrap();
    }
    (service, store)
}

pub(crate) fn upload(title: &str, tags: &[&str]) -> MemeUpload {
    MemeUpload {
        title: title.to_string(),
        image_key: format!("{}.png", title.replace(' ', "-")),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        category: None,
    }
}

#[tokio::test]
async fn test_repeated_read_is_served_from_cache() {
    let (service, store) = service_with_users(&["olive"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    let before = store.reads();
    let first = service.get_meme(meme.id).await.unwrap();
    let second = service.get_meme(meme.id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.reads(), before + 1);
}

#[tokio::test]
async fn test_like_invalidates_meme_and_likes() {
    let (service, store) = service_with_users(&["olive", "finn"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    assert_eq!(service.get_meme(meme.id).await.unwrap().unwrap().likes_count, 0);
    assert!(service.get_user_likes("finn", &[meme.id]).await.unwrap().is_empty());

    let toggle = service.toggle_like("finn", meme.id).await.unwrap();
    assert!(toggle.liked);
    assert_eq!(toggle.likes_count, 1);

    let before = store.reads();
    assert_eq!(service.get_meme(meme.id).await.unwrap().unwrap().likes_count, 1);
    assert_eq!(
        service.get_user_likes("finn", &[meme.id]).await.unwrap(),
        vec![meme.id]
    );
    assert_eq!(store.reads(), before + 2);
}

#[tokio::test]
async fn test_double_toggle_restores_state() {
    let (service, _) = service_with_users(&["olive", "finn"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    service.toggle_like("finn", meme.id).await.unwrap();
    let second = service.toggle_like("finn", meme.id).await.unwrap();

    assert!(!second.liked);
    assert_eq!(second.likes_count, 0);
    assert_eq!(service.get_meme(meme.id).await.unwrap().unwrap().likes_count, 0);
    assert!(service.get_user_likes("finn", &[meme.id]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_like_on_one_meme_keeps_other_cached() {
    let (service, store) = service_with_users(&["olive", "finn"]).await;
    let a = service.upload_meme("olive", upload("a", &[])).await.unwrap();
    let b = service.upload_meme("olive", upload("b", &[])).await.unwrap();

    service.get_meme(a.id).await.unwrap();
    service.get_meme(b.id).await.unwrap();
    service.toggle_like("finn", a.id).await.unwrap();

    let before = store.reads();
    service.get_meme(b.id).await.unwrap();
    assert_eq!(store.reads(), before);
    service.get_meme(a.id).await.unwrap();
    assert_eq!(store.reads(), before + 1);
}

#[tokio::test]
async fn test_empty_search_short_circuits() {
    let (service, store) = service_with_users(&[]).await;
    let query = SearchQuery {
        query: Some("   ".into()),
        tags: vec![" ".into()],
        category: Some("".into()),
    };

    let results = service
        .search_memes(query, PageRequest::default(), SortMode::Hot)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(store.reads(), 0);
    assert!(service.cache().is_empty().await);
}

#[tokio::test]
async fn test_search_requires_all_tags() {
    let (service, _) = service_with_users(&["olive"]).await;
    let both = service
        .upload_meme("olive", upload("both", &["react", "css"]))
        .await
        .unwrap();
    service
        .upload_meme("olive", upload("one", &["react"]))
        .await
        .unwrap();

    let query = SearchQuery {
        query: None,
        tags: vec!["React".into(), "CSS".into()],
        category: None,
    };
    let results = service
        .search_memes(query, PageRequest::default(), SortMode::Recent)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, both.id);
}

#[tokio::test]
async fn test_upload_comment_delete_lifecycle() {
    let (service, _) = service_with_users(&["olive", "finn"]).await;
    let first = PageRequest::new(Some(0), Some(1));
    assert!(service.get_popular_tags().await.unwrap().is_empty());
    assert_eq!(service.get_system_status().await.unwrap().memes, 0);

    let meme = service
        .upload_meme("olive", upload("stack", &["react", "css"]))
        .await
        .unwrap();
    assert_eq!(meme.tags, vec!["react", "css"]);
    assert_eq!(meme.image_url, "/media/stack.png");

    let tags = service.get_popular_tags().await.unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(service.get_system_status().await.unwrap().memes, 1);

    let recent = service.get_recent_memes(first).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].comments_count, 0);
    assert!(service.get_meme_comments(meme.id).await.unwrap().is_empty());

    service
        .add_comment(meme.id, "finn", "  nice  ")
        .await
        .unwrap();

    // The feed page is tagged with the memes it contains.
    let recent = service.get_recent_memes(first).await.unwrap();
    assert_eq!(recent[0].comments_count, 1);
    let comments = service.get_meme_comments(meme.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "nice");

    let notifications = service.get_notifications("olive").await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Comment);

    service.delete_meme("olive", meme.id).await.unwrap();

    assert!(service.get_meme(meme.id).await.unwrap().is_none());
    assert!(service
        .get_recent_memes(first)
        .await
        .unwrap()
        .is_empty());
    assert!(service.get_meme_comments(meme.id).await.unwrap().is_empty());
    assert_eq!(service.get_system_status().await.unwrap().memes, 0);
}

#[tokio::test]
async fn test_hot_ties_break_by_recency() {
    let (service, _) = service_with_users(&["olive", "finn"]).await;
    let older = service.upload_meme("olive", upload("older", &[])).await.unwrap();
    let newer = service.upload_meme("olive", upload("newer", &[])).await.unwrap();

    let hot = service
        .get_hot_memes(PageRequest::default(), SortMode::Hot, TimeRange::All)
        .await
        .unwrap();
    assert_eq!(
        hot.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );

    service.toggle_like("finn", older.id).await.unwrap();
    let hot = service
        .get_hot_memes(PageRequest::default(), SortMode::Hot, TimeRange::All)
        .await
        .unwrap();
    assert_eq!(hot[0].id, older.id);
}

#[tokio::test]
async fn test_store_failure_is_not_cached() {
    let (service, store) = service_with_users(&["olive"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    store.set_failing(true);
    let err = service.get_meme(meme.id).await.unwrap_err();
    assert!(matches!(err, AppError::Store(StoreError::Unavailable(_))));
    assert!(service.cache().is_empty().await);

    store.set_failing(false);
    assert!(service.get_meme(meme.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_writes_require_known_user() {
    let (service, _) = service_with_users(&["olive"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    let err = service.toggle_like("ghost", meme.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = service.upload_meme("ghost", upload("x", &[])).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = service.get_notifications("ghost").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_delete_requires_owner() {
    let (service, _) = service_with_users(&["olive", "finn"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    let err = service.delete_meme("finn", meme.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = service.delete_meme("olive", Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(service.get_meme(meme.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let (service, _) = service_with_users(&["olive"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    let err = service.upload_meme("olive", upload("   ", &[])).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));

    let too_many: Vec<String> = (0..11).map(|i| format!("t{i}")).collect();
    let too_many: Vec<&str> = too_many.iter().map(String::as_str).collect();
    let err = service
        .upload_meme("olive", upload("tags", &too_many))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));

    let err = service.add_comment(meme.id, "olive", " ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));
    let err = service
        .add_comment(meme.id, "olive", &"x".repeat(1001))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_user_likes_empty_and_order_insensitive() {
    let (service, store) = service_with_users(&["olive", "finn"]).await;
    let a = service.upload_meme("olive", upload("a", &[])).await.unwrap();
    let b = service.upload_meme("olive", upload("b", &[])).await.unwrap();

    assert!(service.get_user_likes("finn", &[]).await.unwrap().is_empty());
    assert_eq!(store.reads(), 0);

    service.get_user_likes("finn", &[a.id, b.id]).await.unwrap();
    service.get_user_likes("finn", &[b.id, a.id, b.id]).await.unwrap();
    assert_eq!(store.reads(), 1);
}

#[tokio::test]
async fn test_profile_counters_follow_likes() {
    let (service, _) = service_with_users(&["olive", "finn"]).await;
    let meme = service.upload_meme("olive", upload("cat", &[])).await.unwrap();

    let profile = service.get_user_profile("olive").await.unwrap().unwrap();
    assert_eq!((profile.memes_count, profile.total_likes), (1, 0));

    service.toggle_like("finn", meme.id).await.unwrap();
    let profile = service.get_user_profile("olive").await.unwrap().unwrap();
    assert_eq!(profile.total_likes, 1);

    assert!(service.get_user_profile("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_profile_update_evicts_profile() {
    let (service, _) = service_with_users(&["olive"]).await;
    assert_eq!(
        service.get_user_profile("olive").await.unwrap().unwrap().user.name,
        "OLIVE"
    );

    let updated = service
        .update_profile(
            "olive",
            ProfileUpdate {
                name: Some("  Olive Oyl ".into()),
                tags: Some(vec!["Cats".into(), "cats".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Olive Oyl");
    assert_eq!(updated.tags, vec!["cats"]);

    let profile = service.get_user_profile("olive").await.unwrap().unwrap();
    assert_eq!(profile.user.name, "Olive Oyl");
}

#[tokio::test]
async fn test_register_duplicate_conflicts() {
    let (service, _) = service_with_users(&["olive"]).await;
    let err = service
        .register_user(NewUser {
            id: "olive".into(),
            name: "Again".into(),
            image: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Store(StoreError::Conflict(_))));
}

#[tokio::test]
async fn test_new_category_evicts_category_list() {
    let (service, _) = service_with_users(&["olive"]).await;
    assert!(service.get_all_categories().await.unwrap().is_empty());

    let mut form = upload("cat", &[]);
    form.category = Some("Animals".into());
    service.upload_meme("olive", form).await.unwrap();

    let categories = service.get_all_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "animals");
}

#[tokio::test]
async fn test_category_counts_follow_uploads_and_deletes() {
    let (service, _) = service_with_users(&["olive"]).await;

    let mut first = upload("a", &[]);
    first.category = Some("Animals".into());
    let a = service.upload_meme("olive", first).await.unwrap();
    assert_eq!(service.get_all_categories().await.unwrap()[0].memes_count, 1);

    let mut second = upload("b", &[]);
    second.category = Some("animals".into());
    service.upload_meme("olive", second).await.unwrap();
    let categories = service.get_all_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].memes_count, 2);

    service.delete_meme("olive", a.id).await.unwrap();
    assert_eq!(service.get_all_categories().await.unwrap()[0].memes_count, 1);
}

#[tokio::test]
async fn test_register_rejects_reserved_id() {
    let (service, _) = service_with_users(&[]).await;
    let err = service
        .register_user(NewUser {
            id: " me ".into(),
            name: "Me".into(),
            image: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_annotate_marks_liked() {
    let (service, _) = service_with_users(&["olive", "finn"]).await;
    let a = service.upload_meme("olive", upload("a", &[])).await.unwrap();
    let b = service.upload_meme("olive", upload("b", &[])).await.unwrap();
    service.toggle_like("finn", a.id).await.unwrap();

    let memes = service.get_recent_memes(PageRequest::default()).await.unwrap();
    let views = service.annotate(Some("finn"), memes.clone()).await.unwrap();
    let liked: Vec<_> = views.iter().filter(|v| v.is_liked).map(|v| v.meme.id).collect();
    assert_eq!(liked, vec![a.id]);

    let anonymous = service.annotate(None, memes).await.unwrap();
    assert!(anonymous.iter().all(|v| !v.is_liked));
    assert!(anonymous.iter().any(|v| v.meme.id == b.id));
}

#[tokio::test]
async fn test_admin_invalidate_evicts_tag() {
    let (service, store) = service_with_users(&[]).await;
    service.get_all_categories().await.unwrap();
    let removed = service
        .invalidation()
        .invalidate(&[CacheTag::categories()])
        .await;
    assert_eq!(removed, 1);
    service.get_all_categories().await.unwrap();
    assert_eq!(store.reads(), 2);
}
