use chrono::Utc;
use futures::future::join_all;
use ns_core::types::REMOVED_SENTINEL;
use ns_core::{Article, ArticleStore, Error, RawArticle, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::source::NewsSource;

const CHARS_PER_MINUTE: usize = 200;
const DEFAULT_CATEGORY: &str = "general";
const SEARCH_CATEGORY: &str = "search";
const NO_SUMMARY: &str = "No summary available for this article";
const NO_CONTENT: &str = "Full content not available";
// Character count assumed when neither content nor description survives
// cleaning, so read_time still lands on a plausible estimate.
const ASSUMED_LENGTH: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestRequest {
    pub category: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub processed: usize,
    pub inserted: usize,
    pub category: String,
    pub query: Option<String>,
}

/// Fetches raw articles from the upstream source, cleans and maps them into
/// the store schema, and upserts them keyed by URL.
pub struct IngestPipeline {
    source: Arc<dyn NewsSource>,
    store: Arc<dyn ArticleStore>,
}

impl IngestPipeline {
    pub fn new(source: Arc<dyn NewsSource>, store: Arc<dyn ArticleStore>) -> Self {
        Self { source, store }
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome> {
        let query = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let category = request
            .category
            .as_deref()
            .unwrap_or(DEFAULT_CATEGORY)
            .to_lowercase();

        let raw = match query {
            Some(q) => {
                info!("🔎 Fetching news for query {:?}", q);
                self.source.search(q).await?
            }
            None => {
                info!("📰 Fetching top headlines for category {}", category);
                self.source.top_headlines(&category).await?
            }
        };

        let tagged_category = if query.is_some() {
            SEARCH_CATEGORY.to_string()
        } else {
            category
        };
        let articles: Vec<Article> = raw
            .iter()
            .filter_map(|r| map_raw_article(r, &tagged_category))
            .collect();
        info!(
            "Processing {} valid articles out of {} fetched",
            articles.len(),
            raw.len()
        );

        let inserted = if articles.is_empty() {
            0
        } else {
            self.store.upsert_articles(&articles).await.map_err(|e| {
                Error::StoreWriteFailed(format!("failed to persist articles: {}", e))
            })?
        };
        info!("💾 Inserted {} new articles", inserted);

        Ok(IngestOutcome {
            processed: articles.len(),
            inserted,
            category: tagged_category,
            query: query.map(str::to_string),
        })
    }

    /// Fan one ingest out per category. The calls are independent and joined
    /// with `join_all`; a failure in one does not cancel the others.
    pub async fn ingest_categories(
        &self,
        categories: &[String],
    ) -> Vec<(String, Result<IngestOutcome>)> {
        let futures: Vec<_> = categories
            .iter()
            .map(|category| async move {
                let outcome = self
                    .ingest(IngestRequest {
                        category: Some(category.clone()),
                        query: None,
                    })
                    .await;
                (category.clone(), outcome)
            })
            .collect();
        join_all(futures).await
    }
}

/// Strips a trailing bracketed truncation marker like "[+1234 chars]" the
/// upstream API appends to cut-off bodies.
fn clean_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.ends_with(']') {
        if let Some(start) = trimmed.rfind('[') {
            return trimmed[..start].trim_end().to_string();
        }
    }
    trimmed.to_string()
}

fn map_raw_article(raw: &RawArticle, category: &str) -> Option<Article> {
    let url = raw.url.as_deref()?.trim();
    if url.is_empty() {
        return None;
    }
    let title = raw.title.as_deref().unwrap_or("").trim();
    let description = raw.description.as_deref().unwrap_or("").trim();
    if title.is_empty() || description.is_empty() {
        return None;
    }
    if title.contains(REMOVED_SENTINEL) || description.contains(REMOVED_SENTINEL) {
        return None;
    }

    let clean_description = clean_text(description);
    let clean_content = clean_text(raw.content.as_deref().unwrap_or(""));

    let summary = if !clean_description.is_empty() {
        clean_description.clone()
    } else if !clean_content.is_empty() {
        clean_content.clone()
    } else {
        NO_SUMMARY.to_string()
    };
    let content = if !clean_content.is_empty() {
        clean_content.clone()
    } else if !clean_description.is_empty() {
        clean_description.clone()
    } else {
        NO_CONTENT.to_string()
    };

    let length = if !clean_content.is_empty() {
        clean_content.len()
    } else if !clean_description.is_empty() {
        clean_description.len()
    } else {
        ASSUMED_LENGTH
    };
    let read_time = length.div_ceil(CHARS_PER_MINUTE).max(1) as u32;

    Some(Article {
        url: url.to_string(),
        title: title.to_string(),
        summary,
        content,
        category: category.to_string(),
        source: raw.source.name.clone(),
        author: raw.author.clone(),
        image_url: raw.url_to_image.clone(),
        published_at: raw.published_at.unwrap_or_else(Utc::now),
        read_time,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ns_core::types::RawSource;
    use ns_storage::MemoryStorage;
    use std::collections::HashMap;

    fn raw(url: &str, title: &str, description: &str) -> RawArticle {
        RawArticle {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            content: Some(format!("{} [+2370 chars]", description)),
            source: RawSource {
                name: Some("Test Wire".to_string()),
            },
            author: Some("Test Author".to_string()),
            url: Some(url.to_string()),
            url_to_image: None,
            published_at: Some(Utc::now()),
        }
    }

    /// Scripted source: per-key article lists, or failure for keys in `down`.
    struct MockSource {
        headlines: HashMap<String, Vec<RawArticle>>,
        searches: HashMap<String, Vec<RawArticle>>,
        down: Vec<String>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                headlines: HashMap::new(),
                searches: HashMap::new(),
                down: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl NewsSource for MockSource {
        async fn top_headlines(&self, category: &str) -> Result<Vec<RawArticle>> {
            if self.down.iter().any(|c| c == category) {
                return Err(Error::SourceUnavailable("news API returned 503".to_string()));
            }
            Ok(self.headlines.get(category).cloned().unwrap_or_default())
        }

        async fn search(&self, query: &str) -> Result<Vec<RawArticle>> {
            Ok(self.searches.get(query).cloned().unwrap_or_default())
        }
    }

    async fn pipeline(source: MockSource) -> (IngestPipeline, Arc<MemoryStorage>) {
        let store = Arc::new(MemoryStorage::new().await.unwrap());
        (IngestPipeline::new(Arc::new(source), store.clone()), store)
    }

    #[tokio::test]
    async fn test_ingest_maps_and_stores_headlines() {
        let mut source = MockSource::new();
        source.headlines.insert(
            "technology".to_string(),
            vec![raw("http://t.com/1", "Chips are back", "A long chip story.")],
        );
        let (pipeline, store) = pipeline(source).await;

        let outcome = pipeline
            .ingest(IngestRequest {
                category: Some("technology".to_string()),
                query: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.category, "technology");
        assert!(outcome.query.is_none());

        let stored = store.latest(10).await.unwrap();
        assert_eq!(stored[0].category, "technology");
        assert_eq!(stored[0].source.as_deref(), Some("Test Wire"));
        // The "[+2370 chars]" marker is stripped from the content.
        assert_eq!(stored[0].content, "A long chip story.");
        assert!(stored[0].read_time >= 1);
    }

    #[tokio::test]
    async fn test_query_driven_ingest_is_tagged_search() {
        let mut source = MockSource::new();
        source.searches.insert(
            "election".to_string(),
            vec![raw("http://t.com/e", "Election news", "Votes counted.")],
        );
        let (pipeline, store) = pipeline(source).await;

        let outcome = pipeline
            .ingest(IngestRequest {
                category: None,
                query: Some("election".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.category, "search");
        assert_eq!(outcome.query.as_deref(), Some("election"));
        assert_eq!(store.latest(10).await.unwrap()[0].category, "search");
    }

    #[tokio::test]
    async fn test_removed_and_empty_records_are_discarded() {
        let mut source = MockSource::new();
        let mut removed = raw("http://t.com/r", "[Removed]", "[Removed]");
        removed.content = None;
        let mut no_description = raw("http://t.com/n", "Title only", "");
        no_description.description = None;
        source.headlines.insert(
            "general".to_string(),
            vec![
                removed,
                no_description,
                raw("http://t.com/ok", "Kept", "A real story."),
            ],
        );
        let (pipeline, store) = pipeline(source).await;

        let outcome = pipeline.ingest(IngestRequest::default()).await.unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(store.latest(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reingest_counts_no_new_inserts() {
        let mut source = MockSource::new();
        source.headlines.insert(
            "general".to_string(),
            vec![raw("http://t.com/1", "Story", "Body.")],
        );
        let (pipeline, _store) = pipeline(source).await;

        let first = pipeline.ingest(IngestRequest::default()).await.unwrap();
        assert_eq!(first.inserted, 1);
        let second = pipeline.ingest(IngestRequest::default()).await.unwrap();
        assert_eq!(second.processed, 1);
        assert_eq!(second.inserted, 0);
    }

    #[tokio::test]
    async fn test_source_failure_writes_nothing() {
        let mut source = MockSource::new();
        source.down.push("general".to_string());
        let (pipeline, store) = pipeline(source).await;

        let result = pipeline.ingest(IngestRequest::default()).await;
        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
        assert!(store.latest(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_keeps_partial_success() {
        let mut source = MockSource::new();
        for category in ["business", "health", "science", "sports"] {
            source.headlines.insert(
                category.to_string(),
                vec![raw(
                    &format!("http://t.com/{}", category),
                    &format!("{} story", category),
                    "Body.",
                )],
            );
        }
        source.down.push("technology".to_string());
        let (pipeline, store) = pipeline(source).await;

        let categories: Vec<String> = ["business", "health", "science", "sports", "technology"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let outcomes = pipeline.ingest_categories(&categories).await;

        assert_eq!(outcomes.len(), 5);
        let failed: Vec<_> = outcomes.iter().filter(|(_, r)| r.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "technology");
        // The four healthy categories still committed their inserts.
        assert_eq!(store.latest(10).await.unwrap().len(), 4);
    }
}
