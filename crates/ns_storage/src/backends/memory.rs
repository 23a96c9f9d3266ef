use async_trait::async_trait;
use chrono::Utc;
use ns_core::{Article, ArticleStore, Bookmark, HistoryEntry, KvStore, Rating, Result, UserStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Default)]
struct MemoryStore {
    articles: Vec<Article>,
    bookmarks: Vec<Bookmark>,
    ratings: Vec<Rating>,
    history: Vec<HistoryEntry>,
    kv: HashMap<String, String>,
}

pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub async fn new() -> Result<Self> {
        Ok(Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
        })
    }
}

fn newest_first(mut articles: Vec<Article>, limit: usize) -> Vec<Article> {
    // Stable sort keeps arrival order for equal timestamps.
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    articles.truncate(limit);
    articles
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_db_path: Option<&std::path::Path>) -> Result<Self> {
        Self::new().await
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<usize> {
        let mut store = self.store.write().await;
        let mut inserted = 0;
        for article in articles {
            if !store.articles.iter().any(|a| a.url == article.url) {
                store.articles.push(article.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn by_category(&self, category: Option<&str>, limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let articles = store
            .articles
            .iter()
            .filter(|a| category.map_or(true, |c| a.category.eq_ignore_ascii_case(c)))
            .cloned()
            .collect();
        Ok(newest_first(articles, limit))
    }

    async fn matching(&self, pattern: &str, limit: usize) -> Result<Vec<Article>> {
        let needle = pattern.to_lowercase();
        let store = self.store.read().await;
        let articles = store
            .articles
            .iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&needle)
                    || a.summary.to_lowercase().contains(&needle)
                    || a.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(newest_first(articles, limit))
    }

    async fn latest(&self, limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(newest_first(store.articles.clone(), limit))
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn add_bookmark(&self, user_id: &str, article_url: &str) -> Result<()> {
        let mut store = self.store.write().await;
        if !store
            .bookmarks
            .iter()
            .any(|b| b.user_id == user_id && b.article_url == article_url)
        {
            store.bookmarks.push(Bookmark {
                user_id: user_id.to_string(),
                article_url: article_url.to_string(),
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn remove_bookmark(&self, user_id: &str, article_url: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store
            .bookmarks
            .retain(|b| !(b.user_id == user_id && b.article_url == article_url));
        Ok(())
    }

    async fn bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        let store = self.store.read().await;
        let mut bookmarks: Vec<Bookmark> = store
            .bookmarks
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookmarks)
    }

    async fn rate_article(&self, user_id: &str, article_url: &str, rating: u8) -> Result<()> {
        let mut store = self.store.write().await;
        if let Some(existing) = store
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user_id && r.article_url == article_url)
        {
            existing.rating = rating;
            existing.updated_at = Utc::now();
        } else {
            let now = Utc::now();
            store.ratings.push(Rating {
                user_id: user_id.to_string(),
                article_url: article_url.to_string(),
                rating,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }

    async fn ratings(&self, user_id: &str) -> Result<Vec<Rating>> {
        let store = self.store.read().await;
        Ok(store
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn record_read(&self, user_id: &str, article_url: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.history.push(HistoryEntry {
            user_id: user_id.to_string(),
            article_url: article_url.to_string(),
            read_at: Utc::now(),
        });
        Ok(())
    }

    async fn reading_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>> {
        let store = self.store.read().await;
        let mut history: Vec<HistoryEntry> = store
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.read_at.cmp(&a.read_at));
        Ok(history)
    }
}

#[async_trait]
impl KvStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.store.read().await;
        Ok(store.kv.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.kv.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.kv.remove(key);
        Ok(())
    }
}
