use async_trait::async_trait;
use ns_core::{Error, RawArticle, Result};
use serde::Deserialize;

const NEWS_API_BASE: &str = "https://newsapi.org/v2";
const PAGE_SIZE: usize = 20;

/// Upstream headline/search provider.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Top headlines scoped to a category.
    async fn top_headlines(&self, category: &str) -> Result<Vec<RawArticle>>;

    /// Relevance-ranked full-text search.
    async fn search(&self, query: &str) -> Result<Vec<RawArticle>>;
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<RawArticle>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("News API error ({}): {}", status, body);
            return Err(Error::SourceUnavailable(format!(
                "news API returned {}",
                status
            )));
        }

        let data: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("invalid response body: {}", e)))?;
        Ok(data.articles)
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn top_headlines(&self, category: &str) -> Result<Vec<RawArticle>> {
        tracing::debug!("Fetching top headlines for category {}", category);
        let url = format!(
            "{}/top-headlines?country=us&category={}&pageSize={}&apiKey={}",
            NEWS_API_BASE, category, PAGE_SIZE, self.api_key
        );
        self.fetch(&url).await
    }

    async fn search(&self, query: &str) -> Result<Vec<RawArticle>> {
        tracing::debug!("Searching news for {:?}", query);
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = format!(
            "{}/everything?q={}&pageSize={}&sortBy=relevancy&language=en&apiKey={}",
            NEWS_API_BASE, encoded, PAGE_SIZE, self.api_key
        );
        self.fetch(&url).await
    }
}
