//! API Module
//!
//! HTTP handlers and routing for the meme REST API.
//!
//! # Endpoints
//! - `GET /memes/recent`, `/memes/hot`, `/memes/search` - Feeds
//! - `GET /memes/:id`, `/memes/:id/comments` - A meme and its comments
//! - `POST /memes`, `DELETE /memes/:id` - Upload and delete
//! - `POST /memes/:id/like`, `/memes/:id/comments` - Engagement
//! - `GET /users/:id`, `/users/:id/memes`, `/users/:id/likes` - Profiles
//! - `POST /users`, `GET`/`PATCH /users/me` - User records
//! - `GET /notifications`, `/tags/popular`, `/categories`, `/status`
//! - `GET /stats`, `POST /cache/invalidate` - Cache administration
//! - `GET /health` - Health check endpoint

pub mod extract;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
