use crate::types::{Article, Bookmark, HistoryEntry, Rating};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert articles, silently ignoring URL conflicts. Returns the number
    /// of rows actually inserted, which may be lower than the number given.
    async fn upsert_articles(&self, articles: &[Article]) -> Result<usize>;

    /// Newest-first listing, optionally filtered by category.
    async fn by_category(&self, category: Option<&str>, limit: usize) -> Result<Vec<Article>>;

    /// Case-insensitive substring match across title, summary and content,
    /// newest first.
    async fn matching(&self, pattern: &str, limit: usize) -> Result<Vec<Article>>;

    /// The most recently published articles regardless of match.
    async fn latest(&self, limit: usize) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn add_bookmark(&self, user_id: &str, article_url: &str) -> Result<()>;
    async fn remove_bookmark(&self, user_id: &str, article_url: &str) -> Result<()>;
    async fn bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>>;

    /// Upsert a rating for the (user, article) pair.
    async fn rate_article(&self, user_id: &str, article_url: &str, rating: u8) -> Result<()>;
    async fn ratings(&self, user_id: &str) -> Result<Vec<Rating>>;

    async fn record_read(&self, user_id: &str, article_url: &str) -> Result<()>;
    async fn reading_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>>;
}

/// Small persisted key-value surface backing per-user preference and
/// notification state.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}
