use ns_core::{Article, ArticleStore, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::pipeline::{IngestPipeline, IngestRequest};

/// Stop broadening once this many results are in hand.
const MIN_RESULTS: usize = 2;
const LOCAL_LIMIT: usize = 50;
const TOKEN_LIMIT: usize = 20;
const FLOOR_LIMIT: usize = 10;
const MIN_TOKEN_LEN: usize = 3;

/// Evaluates an ordered list of search strategies until one produces enough
/// results: local lookup, ingest-and-requery, token broadening, and finally
/// the most recent articles regardless of match. Prefers precise matches
/// over broad ones, and never returns fewer than two results while the
/// store holds that many articles at all.
pub struct SearchOrchestrator {
    store: Arc<dyn ArticleStore>,
    pipeline: Arc<IngestPipeline>,
}

impl SearchOrchestrator {
    pub fn new(store: Arc<dyn ArticleStore>, pipeline: Arc<IngestPipeline>) -> Self {
        Self { store, pipeline }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Article>> {
        let query = query.trim();

        // Stage 1: local lookup.
        let local = self.store.matching(query, LOCAL_LIMIT).await?;
        if local.len() >= MIN_RESULTS {
            return Ok(local);
        }

        // Stage 2: pull fresh articles for the query. An unreachable source
        // ends the search here.
        info!(
            "🔎 Only {} local matches for {:?}, fetching from source",
            local.len(),
            query
        );
        self.pipeline
            .ingest(IngestRequest {
                category: None,
                query: Some(query.to_string()),
            })
            .await?;

        // Stage 3: re-run the local lookup.
        let mut results = self.store.matching(query, LOCAL_LIMIT).await?;
        if results.len() >= MIN_RESULTS {
            return Ok(results);
        }

        // Stage 4: broaden to the single longest useful token, merging with
        // the precise matches already found. Arrival order is kept, so
        // precise matches stay in front.
        if let Some(token) = broadening_token(query) {
            debug!("Broadening search to token {:?}", token);
            let broad = self.store.matching(&token, TOKEN_LIMIT).await?;
            for article in broad {
                if !results.iter().any(|a| a.url == article.url) {
                    results.push(article);
                }
            }
            if results.len() >= MIN_RESULTS {
                return Ok(results);
            }
        }

        // Stage 5: fallback floor, the newest articles regardless of match.
        // Empty only when the store itself is empty.
        debug!("Falling back to latest articles for {:?}", query);
        self.store.latest(FLOOR_LIMIT).await
    }
}

/// The single longest distinct token of length >= 3, lowercased.
fn broadening_token(query: &str) -> Option<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in query.split_whitespace() {
        let token = token.to_lowercase();
        if token.chars().count() >= MIN_TOKEN_LEN && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens.into_iter().max_by_key(|t| t.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use ns_core::types::RawSource;
    use ns_core::{Error, RawArticle};
    use ns_storage::MemoryStorage;
    use std::collections::HashMap;

    use crate::source::NewsSource;

    fn article(url: &str, title: &str, age_minutes: i64) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            summary: format!("Summary of {}", title),
            content: format!("Content of {}", title),
            category: "general".to_string(),
            source: Some("test".to_string()),
            author: None,
            image_url: None,
            published_at: Utc::now() - Duration::minutes(age_minutes),
            read_time: 1,
            created_at: Utc::now(),
        }
    }

    fn raw(url: &str, title: &str) -> RawArticle {
        RawArticle {
            title: Some(title.to_string()),
            description: Some(format!("About {}", title)),
            content: Some(format!("Full text of {}", title)),
            source: RawSource {
                name: Some("Test Wire".to_string()),
            },
            author: None,
            url: Some(url.to_string()),
            url_to_image: None,
            published_at: Some(Utc::now()),
        }
    }

    struct MockSource {
        searches: HashMap<String, Vec<RawArticle>>,
        unavailable: bool,
    }

    impl MockSource {
        fn empty() -> Self {
            Self {
                searches: HashMap::new(),
                unavailable: false,
            }
        }
    }

    #[async_trait]
    impl NewsSource for MockSource {
        async fn top_headlines(&self, _category: &str) -> Result<Vec<RawArticle>> {
            if self.unavailable {
                return Err(Error::SourceUnavailable("news API returned 503".to_string()));
            }
            Ok(Vec::new())
        }

        async fn search(&self, query: &str) -> Result<Vec<RawArticle>> {
            if self.unavailable {
                return Err(Error::SourceUnavailable("news API returned 503".to_string()));
            }
            Ok(self.searches.get(query).cloned().unwrap_or_default())
        }
    }

    async fn orchestrator(source: MockSource) -> (SearchOrchestrator, Arc<MemoryStorage>) {
        let store = Arc::new(MemoryStorage::new().await.unwrap());
        let pipeline = Arc::new(IngestPipeline::new(Arc::new(source), store.clone()));
        (SearchOrchestrator::new(store.clone(), pipeline), store)
    }

    #[tokio::test]
    async fn test_local_matches_satisfy_without_ingest() {
        // Source is unavailable; two local matches mean it is never called.
        let mut source = MockSource::empty();
        source.unavailable = true;
        let (orchestrator, store) = orchestrator(source).await;
        store
            .upsert_articles(&[
                article("http://t.com/1", "Election night", 10),
                article("http://t.com/2", "Election recap", 5),
            ])
            .await
            .unwrap();

        let results = orchestrator.search("election").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "http://t.com/2");
    }

    #[tokio::test]
    async fn test_ingest_then_requery() {
        let mut source = MockSource::empty();
        source.searches.insert(
            "election".to_string(),
            vec![
                raw("http://t.com/new1", "Election update"),
                raw("http://t.com/new2", "Election analysis"),
            ],
        );
        let (orchestrator, store) = orchestrator(source).await;
        store
            .upsert_articles(&[article("http://t.com/old", "Election history", 60)])
            .await
            .unwrap();

        let results = orchestrator.search("election").await.unwrap();
        assert_eq!(results.len(), 3);
        // Newest first: the two fresh articles precede the old one.
        assert_eq!(results[2].url, "http://t.com/old");
    }

    #[tokio::test]
    async fn test_token_broadening_merges_without_duplicates() {
        let (orchestrator, store) = orchestrator(MockSource::empty()).await;
        // Nothing matches the full phrase, but the longest token does.
        store
            .upsert_articles(&[
                article("http://t.com/1", "Senate elections primer", 10),
                article("http://t.com/2", "Local elections guide", 5),
            ])
            .await
            .unwrap();

        let results = orchestrator.search("zzz elections").await.unwrap();
        assert_eq!(results.len(), 2);
        let mut urls: Vec<_> = results.iter().map(|a| a.url.as_str()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_floor_returns_latest() {
        let (orchestrator, store) = orchestrator(MockSource::empty()).await;
        store
            .upsert_articles(&[
                article("http://t.com/a", "Alpha", 30),
                article("http://t.com/b", "Beta", 5),
            ])
            .await
            .unwrap();

        // No stage matches "qqqq", tokens included; the floor still returns
        // both stored articles, newest first.
        let results = orchestrator.search("qqqq").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "http://t.com/b");
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_results() {
        let (orchestrator, _store) = orchestrator(MockSource::empty()).await;
        let results = orchestrator.search("anything").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let mut source = MockSource::empty();
        source.unavailable = true;
        let (orchestrator, store) = orchestrator(source).await;
        store
            .upsert_articles(&[article("http://t.com/only", "Lone election story", 5)])
            .await
            .unwrap();

        let result = orchestrator.search("election").await;
        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    }

    #[test]
    fn test_broadening_token_picks_longest_distinct() {
        assert_eq!(
            broadening_token("the great election"),
            Some("election".to_string())
        );
        assert_eq!(broadening_token("a an of"), None);
        assert_eq!(broadening_token(""), None);
    }
}
