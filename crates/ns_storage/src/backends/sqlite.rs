use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ns_core::{Article, ArticleStore, Bookmark, HistoryEntry, KvStore, Rating, Result, UserStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        summary TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT NOT NULL,
        source TEXT,
        author TEXT,
        image_url TEXT,
        published_at TEXT NOT NULL,
        read_time INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookmarks (
        user_id TEXT NOT NULL,
        article_url TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (user_id, article_url)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ratings (
        user_id TEXT NOT NULL,
        article_url TEXT NOT NULL,
        rating INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (user_id, article_url)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reading_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        article_url TEXT NOT NULL,
        read_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_state (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./newssphere.db"
    }

    async fn open(db_path: Option<&Path>) -> Result<Self> {
        let db_path = db_path.unwrap_or_else(|| Path::new("newssphere.db"));
        Self::new_with_path(db_path).await
    }
}

impl SqliteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| ns_core::Error::Storage(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| ns_core::Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ns_core::Error::Storage(format!("Failed to parse timestamp: {}", e)))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        url: row.get("url"),
        title: row.get("title"),
        summary: row.get("summary"),
        content: row.get("content"),
        category: row.get("category"),
        source: row.get("source"),
        author: row.get("author"),
        image_url: row.get("image_url"),
        published_at: parse_timestamp(&row.get::<String, _>("published_at"))?,
        read_time: row.get::<i64, _>("read_time") as u32,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

#[async_trait]
impl ArticleStore for SqliteStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<usize> {
        let mut inserted = 0;
        for article in articles {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO articles
                (url, title, summary, content, category, source, author, image_url, published_at, read_time, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.url)
            .bind(&article.title)
            .bind(&article.summary)
            .bind(&article.content)
            .bind(&article.category)
            .bind(article.source.as_deref())
            .bind(article.author.as_deref())
            .bind(article.image_url.as_deref())
            .bind(article.published_at.to_rfc3339())
            .bind(article.read_time as i64)
            .bind(article.created_at.to_rfc3339())
            .execute(&*self.pool)
            .await
            .map_err(|e| ns_core::Error::StoreWriteFailed(format!("Failed to store article: {}", e)))?;

            inserted += result.rows_affected() as usize;
        }
        Ok(inserted)
    }

    async fn by_category(&self, category: Option<&str>, limit: usize) -> Result<Vec<Article>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(
                    r#"
                    SELECT * FROM articles
                    WHERE category = ? COLLATE NOCASE
                    ORDER BY datetime(published_at) DESC
                    LIMIT ?
                    "#,
                )
                .bind(category)
                .bind(limit as i64)
                .fetch_all(&*self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM articles
                    ORDER BY datetime(published_at) DESC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&*self.pool)
                .await
            }
        }
        .map_err(|e| ns_core::Error::Storage(format!("Failed to list articles: {}", e)))?;

        rows.iter().map(article_from_row).collect()
    }

    async fn matching(&self, pattern: &str, limit: usize) -> Result<Vec<Article>> {
        let like = format!("%{}%", pattern);
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE title LIKE ?1 OR summary LIKE ?1 OR content LIKE ?1
            ORDER BY datetime(published_at) DESC
            LIMIT ?2
            "#,
        )
        .bind(&like)
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| ns_core::Error::Storage(format!("Failed to search articles: {}", e)))?;

        rows.iter().map(article_from_row).collect()
    }

    async fn latest(&self, limit: usize) -> Result<Vec<Article>> {
        self.by_category(None, limit).await
    }
}

#[async_trait]
impl UserStore for SqliteStorage {
    async fn add_bookmark(&self, user_id: &str, article_url: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO bookmarks (user_id, article_url, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(article_url)
        .bind(Utc::now().to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(|e| ns_core::Error::StoreWriteFailed(format!("Failed to add bookmark: {}", e)))?;
        Ok(())
    }

    async fn remove_bookmark(&self, user_id: &str, article_url: &str) -> Result<()> {
        sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND article_url = ?")
            .bind(user_id)
            .bind(article_url)
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                ns_core::Error::StoreWriteFailed(format!("Failed to remove bookmark: {}", e))
            })?;
        Ok(())
    }

    async fn bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        let rows = sqlx::query(
            "SELECT * FROM bookmarks WHERE user_id = ? ORDER BY datetime(created_at) DESC",
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| ns_core::Error::Storage(format!("Failed to list bookmarks: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(Bookmark {
                    user_id: row.get("user_id"),
                    article_url: row.get("article_url"),
                    created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
                })
            })
            .collect()
    }

    async fn rate_article(&self, user_id: &str, article_url: &str, rating: u8) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO ratings (user_id, article_url, rating, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, article_url)
            DO UPDATE SET rating = excluded.rating, updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(article_url)
        .bind(rating as i64)
        .bind(&now)
        .bind(&now)
        .execute(&*self.pool)
        .await
        .map_err(|e| ns_core::Error::StoreWriteFailed(format!("Failed to store rating: {}", e)))?;
        Ok(())
    }

    async fn ratings(&self, user_id: &str) -> Result<Vec<Rating>> {
        let rows = sqlx::query("SELECT * FROM ratings WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| ns_core::Error::Storage(format!("Failed to list ratings: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(Rating {
                    user_id: row.get("user_id"),
                    article_url: row.get("article_url"),
                    rating: row.get::<i64, _>("rating") as u8,
                    created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
                    updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
                })
            })
            .collect()
    }

    async fn record_read(&self, user_id: &str, article_url: &str) -> Result<()> {
        sqlx::query("INSERT INTO reading_history (user_id, article_url, read_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(article_url)
            .bind(Utc::now().to_rfc3339())
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                ns_core::Error::StoreWriteFailed(format!("Failed to record read: {}", e))
            })?;
        Ok(())
    }

    async fn reading_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM reading_history WHERE user_id = ? ORDER BY datetime(read_at) DESC",
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| ns_core::Error::Storage(format!("Failed to list reading history: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(HistoryEntry {
                    user_id: row.get("user_id"),
                    article_url: row.get("article_url"),
                    read_at: parse_timestamp(&row.get::<String, _>("read_at"))?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl KvStore for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM user_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| ns_core::Error::Storage(format!("Failed to read state: {}", e)))?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO user_state (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&*self.pool)
            .await
            .map_err(|e| ns_core::Error::StoreWriteFailed(format!("Failed to write state: {}", e)))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_state WHERE key = ?")
            .bind(key)
            .execute(&*self.pool)
            .await
            .map_err(|e| ns_core::Error::StoreWriteFailed(format!("Failed to remove state: {}", e)))?;
        Ok(())
    }
}
