//! Error types for the meme service
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::cache::CacheError;
use crate::models::ErrorResponse;
use crate::store::StoreError;

// == App Error Enum ==
#[derive(Error, Debug)]
pub enum AppError {
    /// Requested meme or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// No identity, an unknown identity, or an identity that does not own the target
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The entity store failed; never cached, never swallowed
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == Extractor Rejections ==
// Malformed input is a client error whatever axum would have answered.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the meme service.
pub type Result<T> = std::result::Result<T, AppError>;
