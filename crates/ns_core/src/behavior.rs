use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lightweight per-user behavior, persisted as JSON through a key-value
/// store so it can move server-side without changing call sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserBehavior {
    /// Most recent distinct search queries, oldest first.
    pub searches: Vec<String>,
    pub viewed_categories: HashMap<String, u32>,
    /// Most recent distinct clicked article URLs, oldest first.
    pub clicked_articles: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Search,
    Category,
    Trending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub article_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}
