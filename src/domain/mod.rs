//! Domain Module
//!
//! Entities and projections shared by the store, the service and the API.

pub mod feed;
pub mod meme;
pub mod user;

pub use feed::{
    sort_memes, Category, EngagementScore, HotScorer, PageRequest, SearchQuery, SortMode,
    SystemStatus, TagCount, TimeRange,
};
pub use meme::{
    normalize_label, normalize_labels, Comment, LikeToggle, Meme, MemeUpload, MemeView, NewMeme,
    Notification, NotificationKind, Owner, UploadedMeme,
};
pub use user::{NewUser, ProfileUpdate, Socials, User, UserProfile};
