//! API Handlers
//!
//! HTTP request handlers for each meme API endpoint. Handlers translate
//! HTTP into service calls; caching and invalidation happen below them.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::warn;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::cache::CacheTag;
use crate::config::Config;
use crate::domain::{
    Category, Comment, Meme, MemeUpload, MemeView, NewUser, Notification, PageRequest,
    ProfileUpdate, SystemStatus, TagCount, User, UserProfile,
};
use crate::error::{AppError, Result};
use crate::models::{
    CommentRequest, DeleteResponse, FeedResponse, HealthResponse, HotParams, InvalidateRequest,
    InvalidateResponse, LikeResponse, LikesParams, LikesResponse, PageParams, SearchParams,
    StatsResponse,
};
use crate::service::MemeService;
use crate::store::MemeStore;

/// Header carrying the caller's user id, set by the session layer in front of the API.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: MemeService,
}

impl AppState {
    pub fn new(service: MemeService) -> Self {
        Self { service }
    }

    /// Creates a new AppState from configuration over the given store.
    pub fn from_config(config: &Config, store: std::sync::Arc<dyn MemeStore>) -> Self {
        Self::new(MemeService::from_config(config, store))
    }
}

// == Identity ==
fn viewer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn require_viewer(headers: &HeaderMap) -> Result<&str> {
    viewer(headers).ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))
}

/// Turns a feed read into a response, serving an empty page if the store failed.
async fn feed(
    state: &AppState,
    headers: &HeaderMap,
    page: PageRequest,
    memes: Result<Vec<Meme>>,
    feed_name: &str,
) -> Json<FeedResponse> {
    let memes = match memes {
        Ok(memes) => memes,
        Err(err) => {
            warn!(feed = feed_name, error = %err, "serving empty feed");
            return Json(FeedResponse::empty(page));
        }
    };
    match state.service.annotate(viewer(headers), memes.clone()).await {
        Ok(views) => Json(FeedResponse::new(views, page)),
        Err(err) => {
            warn!(feed = feed_name, error = %err, "like annotation unavailable");
            let views = memes.into_iter().map(|m| MemeView::new(m, false)).collect();
            Json(FeedResponse::new(views, page))
        }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.service.cache().stats().await))
}

/// Handler for GET /status
pub async fn status_handler(State(state): State<AppState>) -> Result<Json<SystemStatus>> {
    Ok(Json(state.service.get_system_status().await?))
}

// == Feeds ==

/// Handler for GET /memes/recent
pub async fn recent_memes_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Json<FeedResponse> {
    let page = params.page();
    let memes = state.service.get_recent_memes(page).await;
    feed(&state, &headers, page, memes, "recent").await
}

/// Handler for GET /memes/hot
pub async fn hot_memes_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(params): ApiQuery<HotParams>,
) -> Json<FeedResponse> {
    let page = params.page();
    let memes = state
        .service
        .get_hot_memes(
            page,
            params.sort.unwrap_or_default(),
            params.range.unwrap_or_default(),
        )
        .await;
    feed(&state, &headers, page, memes, "hot").await
}

/// Handler for GET /memes/search
pub async fn search_memes_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Json<FeedResponse> {
    let page = params.page();
    let memes = state
        .service
        .search_memes(params.query(), page, params.sort.unwrap_or_default())
        .await;
    feed(&state, &headers, page, memes, "search").await
}

/// Handler for GET /users/:id/memes
pub async fn user_memes_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Json<FeedResponse> {
    let page = params.page();
    let memes = state.service.get_user_memes(&user_id, page).await;
    feed(&state, &headers, page, memes, "user").await
}

// == Memes ==

/// Handler for GET /memes/:id
pub async fn meme_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MemeView>> {
    let meme = state
        .service
        .get_meme(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("meme {id}")))?;
    let mut views = state.service.annotate(viewer(&headers), vec![meme]).await?;
    views
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("meme {id}")))
}

/// Handler for GET /memes/:id/comments
pub async fn comments_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Comment>>> {
    Ok(Json(state.service.get_meme_comments(id).await?))
}

/// Handler for POST /memes
pub async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(upload): ApiJson<MemeUpload>,
) -> Result<(StatusCode, Json<Meme>)> {
    let user_id = require_viewer(&headers)?;
    let meme = state.service.upload_meme(user_id, upload).await?;
    Ok((StatusCode::CREATED, Json(meme)))
}

/// Handler for DELETE /memes/:id
pub async fn delete_meme_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DeleteResponse>> {
    let user_id = require_viewer(&headers)?;
    state.service.delete_meme(user_id, id).await?;
    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for POST /memes/:id/like
pub async fn like_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LikeResponse>> {
    let user_id = require_viewer(&headers)?;
    let toggle = state.service.toggle_like(user_id, id).await?;
    Ok(Json(LikeResponse::new(id, &toggle)))
}

/// Handler for POST /memes/:id/comments
pub async fn add_comment_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let user_id = require_viewer(&headers)?;
    let comment = state.service.add_comment(id, user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// == Users ==

/// Handler for GET /users/:id
pub async fn user_handler(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<UserProfile>> {
    state
        .service
        .get_user_profile(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
}

/// Handler for GET /users/:id/likes
pub async fn user_likes_handler(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<LikesParams>,
) -> Result<Json<LikesResponse>> {
    let ids = params.meme_ids().map_err(AppError::InvalidRequest)?;
    let liked = state.service.get_user_likes(&user_id, &ids).await?;
    Ok(Json(LikesResponse { user_id, liked }))
}

/// Handler for GET /notifications
pub async fn notifications_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>> {
    let user_id = require_viewer(&headers)?;
    Ok(Json(state.service.get_notifications(user_id).await?))
}

/// Handler for POST /users
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.service.register_user(user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for GET /users/me
pub async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>> {
    let user_id = require_viewer(&headers)?;
    state
        .service
        .get_user_profile(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized(format!("unknown user {user_id}")))
}

/// Handler for PATCH /users/me
pub async fn update_profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<User>> {
    let user_id = require_viewer(&headers)?;
    Ok(Json(state.service.update_profile(user_id, update).await?))
}

// == Reference data ==

/// Handler for GET /tags/popular
pub async fn popular_tags_handler(State(state): State<AppState>) -> Result<Json<Vec<TagCount>>> {
    Ok(Json(state.service.get_popular_tags().await?))
}

/// Handler for GET /categories
pub async fn categories_handler(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.service.get_all_categories().await?))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }
    let tags: Vec<CacheTag> = req.tags.iter().map(|t| CacheTag::from(t.trim())).collect();
    let removed = state.service.invalidation().invalidate(&tags).await;
    Ok(Json(InvalidateResponse {
        tags: tags.iter().map(|t| t.as_str().to_string()).collect(),
        removed,
    }))
}
