//! Request and Response models for the meme API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    CommentRequest, HotParams, InvalidateRequest, LikesParams, PageParams, SearchParams,
};
pub use responses::{
    DeleteResponse, ErrorResponse, FeedResponse, HealthResponse, InvalidateResponse, LikeResponse,
    LikesResponse, StatsResponse,
};
