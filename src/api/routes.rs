//! API Routes
//!
//! Configures the Axum router with all meme API endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_comment_handler, categories_handler, comments_handler, delete_meme_handler,
    health_handler, hot_memes_handler, invalidate_handler, like_handler, me_handler, meme_handler,
    notifications_handler, popular_tags_handler, recent_memes_handler, register_handler,
    search_memes_handler, stats_handler, status_handler, update_profile_handler, upload_handler,
    user_handler, user_likes_handler, user_memes_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/status", get(status_handler))
        .route("/memes", post(upload_handler))
        .route("/memes/recent", get(recent_memes_handler))
        .route("/memes/hot", get(hot_memes_handler))
        .route("/memes/search", get(search_memes_handler))
        .route("/memes/:id", get(meme_handler).delete(delete_meme_handler))
        .route("/memes/:id/like", post(like_handler))
        .route(
            "/memes/:id/comments",
            get(comments_handler).post(add_comment_handler),
        )
        .route("/users", post(register_handler))
        .route("/users/me", get(me_handler).patch(update_profile_handler))
        .route("/users/:id", get(user_handler))
        .route("/users/:id/memes", get(user_memes_handler))
        .route("/users/:id/likes", get(user_likes_handler))
        .route("/notifications", get(notifications_handler))
        .route("/tags/popular", get(popular_tags_handler))
        .route("/categories", get(categories_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
