use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic labels accepted by the upstream headlines endpoint.
pub const CATEGORIES: &[&str] = &[
    "general",
    "business",
    "technology",
    "science",
    "health",
    "sports",
    "entertainment",
];

/// Marker the upstream API substitutes for withdrawn articles.
pub const REMOVED_SENTINEL: &str = "[Removed]";

/// A stored article. The canonical URL is the identity and deduplication
/// key; rows are never mutated or deleted once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub source: Option<String>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Estimated minutes to read, derived from content length. Always >= 1.
    pub read_time: u32,
    pub created_at: DateTime<Utc>,
}

/// Raw record as returned by the upstream news API, before cleaning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub source: RawSource,
    pub author: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "urlToImage")]
    pub url_to_image: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub user_id: String,
    pub article_url: String,
    pub created_at: DateTime<Utc>,
}

/// A 1-5 star rating, upserted per (user, article) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: String,
    pub article_url: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_id: String,
    pub article_url: String,
    pub read_at: DateTime<Utc>,
}
