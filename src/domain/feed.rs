//! Feed ordering, filtering and pagination.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::meme::Meme;

/// Default number of memes per page
pub const DEFAULT_PAGE_LIMIT: usize = 20;
/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: usize = 50;

// == Sort Mode ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Recent,
    #[default]
    Hot,
    Likes,
    Comments,
}

// == Time Range ==
/// Lookback window for the hot feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "3d")]
    ThreeDays,
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "1m")]
    Month,
    #[serde(rename = "3m")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// Length of the window, `None` for an unbounded range.
    pub fn window(self) -> Option<Duration> {
        match self {
            TimeRange::Day => Some(Duration::hours(24)),
            TimeRange::ThreeDays => Some(Duration::days(3)),
            TimeRange::Week => Some(Duration::days(7)),
            TimeRange::Month => Some(Duration::days(30)),
            TimeRange::Quarter => Some(Duration::days(90)),
            TimeRange::Year => Some(Duration::days(365)),
            TimeRange::All => None,
        }
    }

    /// Oldest creation time admitted by the range, measured from `now`.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.window().map(|w| now - w)
    }
}

// == Hot Scoring ==
/// Ranking function for the hot feed.
pub trait HotScorer: Send + Sync {
    fn score(&self, meme: &Meme) -> u64;
}

/// Likes plus twice the comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementScore;

impl HotScorer for EngagementScore {
    fn score(&self, meme: &Meme) -> u64 {
        meme.likes_count
            .saturating_add(meme.comments_count.saturating_mul(2))
    }
}

/// Orders `memes` for `mode`. Every mode breaks ties by recency, newest first.
pub fn sort_memes(memes: &mut [Meme], mode: SortMode, scorer: &dyn HotScorer) {
    let newest_first = |a: &Meme, b: &Meme| b.created_at.cmp(&a.created_at);
    memes.sort_by(|a, b| {
        let primary = match mode {
            SortMode::Recent => Ordering::Equal,
            SortMode::Hot => scorer.score(b).cmp(&scorer.score(a)),
            SortMode::Likes => b.likes_count.cmp(&a.likes_count),
            SortMode::Comments => b.comments_count.cmp(&a.comments_count),
        };
        primary.then_with(|| newest_first(a, b))
    });
}

// == Pagination ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Builds a page request, defaulting and clamping the limit.
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Applies the page window to an ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// == Search ==
/// Search criteria. A meme matches when every present criterion matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SearchQuery {
    /// Case-insensitive title substring
    pub query: Option<String>,
    /// Tags the meme must all carry
    pub tags: Vec<String>,
    pub category: Option<String>,
}

impl SearchQuery {
    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.tags.is_empty() && self.category.is_none()
    }

    pub fn matches(&self, meme: &Meme) -> bool {
        let title_ok = self.query.as_ref().map_or(true, |q| {
            meme.title.to_lowercase().contains(&q.to_lowercase())
        });
        let tags_ok = self.tags.iter().all(|t| meme.tags.contains(t));
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |c| meme.category.as_ref() == Some(c));
        title_ok && tags_ok && category_ok
    }
}

// == Reference data ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub memes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub users: u64,
    pub memes: u64,
    pub likes: u64,
    pub comments: u64,
    pub tags: u64,
    pub categories: u64,
    pub generated_at: DateTime<Utc>,
}
