//! Request DTOs for the meme API
//!
//! Query strings and bodies as they arrive over HTTP, before they become
//! domain types.

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{PageRequest, SearchQuery, SortMode, TimeRange};

/// Splits a comma separated query value, dropping blank items.
fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Paging parameters (`?offset=&limit=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.offset, self.limit)
    }
}

/// Query for GET /memes/hot
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotParams {
    #[serde(default)]
    pub sort: Option<SortMode>,
    #[serde(default)]
    pub range: Option<TimeRange>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl HotParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.offset, self.limit)
    }
}

/// Query for GET /memes/search
///
/// `tags` is a comma separated list; every listed tag must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<SortMode>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchParams {
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            query: self.q.clone(),
            tags: split_list(self.tags.as_deref())
                .into_iter()
                .map(str::to_string)
                .collect(),
            category: self.category.clone(),
        }
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.offset, self.limit)
    }
}

/// Query for GET /users/:id/likes (`?ids=a,b,c`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikesParams {
    #[serde(default)]
    pub ids: Option<String>,
}

impl LikesParams {
    /// Parses the id list, naming the first malformed id on failure.
    pub fn meme_ids(&self) -> Result<Vec<Uuid>, String> {
        split_list(self.ids.as_deref())
            .into_iter()
            .map(|id| Uuid::parse_str(id).map_err(|_| format!("invalid meme id: {id}")))
            .collect()
    }
}

/// Request body for POST /memes/:id/comments
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// Request body for POST /cache/invalidate
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub tags: Vec<String>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tags.is_empty() {
            return Some("At least one tag is required".to_string());
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Some("Tags cannot be empty".to_string());
        }
        None
    }
}
