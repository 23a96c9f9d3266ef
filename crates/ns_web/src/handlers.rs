use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ns_core::types::CATEGORIES;
use ns_core::{Article, Bookmark, Error, HistoryEntry, Notification, Rating};
use ns_ingest::{IngestOutcome, IngestRequest};
use ns_summarize::Summary;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 20;

/// Thin wrapper turning domain errors into JSON error responses. Upstream
/// outages surface as 502, caller mistakes as 400, everything else as 500.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::EmptyInput | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let category = params
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
        .map(str::to_lowercase);
    let articles = state.articles.by_category(category.as_deref(), limit).await?;
    Ok(Json(articles))
}

pub async fn fetch_news(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<Json<IngestOutcome>> {
    let outcome = state.pipeline.ingest(request).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct CategoryOutcome {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<IngestOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Refreshes headlines for the given categories, defaulting to the full
/// known set. Per-category failures are reported inline rather than failing
/// the whole request.
pub async fn refresh_news(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<Vec<CategoryOutcome>>> {
    let categories = request
        .categories
        .unwrap_or_else(|| CATEGORIES.iter().map(|c| c.to_string()).collect());
    let outcomes = state
        .pipeline
        .ingest_categories(&categories)
        .await
        .into_iter()
        .map(|(category, result)| match result {
            Ok(outcome) => CategoryOutcome {
                category,
                outcome: Some(outcome),
                error: None,
            },
            Err(e) => CategoryOutcome {
                category,
                outcome: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    Ok(Json(outcomes))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let results = state.search.search(&params.q).await?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub article_content: String,
    pub max_length: Option<usize>,
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummarizeRequest>,
) -> ApiResult<Json<Summary>> {
    let summary = state
        .summarizer
        .summarize(&request.article_content, request.max_length)
        .await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct BookmarkRequest {
    pub article_url: String,
}

pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<Json<Vec<Bookmark>>> {
    Ok(Json(state.users.bookmarks(&user).await?))
}

pub async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(request): Json<BookmarkRequest>,
) -> ApiResult<StatusCode> {
    state.users.add_bookmark(&user, &request.article_url).await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(request): Json<BookmarkRequest>,
) -> ApiResult<StatusCode> {
    state
        .users
        .remove_bookmark(&user, &request.article_url)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub article_url: String,
    pub rating: u8,
}

fn validate_rating(rating: u8) -> Result<(), Error> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "rating must be between 1 and 5, got {}",
            rating
        )))
    }
}

pub async fn rate_article(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(request): Json<RatingRequest>,
) -> ApiResult<StatusCode> {
    validate_rating(request.rating)?;
    state
        .users
        .rate_article(&user, &request.article_url, request.rating)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_ratings(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<Json<Vec<Rating>>> {
    Ok(Json(state.users.ratings(&user).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReadRequest {
    pub article_url: String,
}

pub async fn record_read(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(request): Json<ReadRequest>,
) -> ApiResult<StatusCode> {
    state.users.record_read(&user, &request.article_url).await?;
    state
        .tracker
        .track_article_click(&user, &request.article_url)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn reading_history(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    Ok(Json(state.users.reading_history(&user).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Search,
    CategoryView,
    ArticleClick,
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub kind: EventKind,
    pub value: String,
}

/// Records a behavioral event. Searches and category views may generate
/// notifications as a side effect.
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(request): Json<EventRequest>,
) -> ApiResult<StatusCode> {
    match request.kind {
        EventKind::Search => state.tracker.track_search(&user, &request.value).await?,
        EventKind::CategoryView => {
            state
                .tracker
                .track_category_view(&user, &request.value)
                .await?
        }
        EventKind::ArticleClick => {
            state
                .tracker
                .track_article_click(&user, &request.value)
                .await?
        }
    }
    Ok(StatusCode::ACCEPTED)
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.tracker.notifications(&user).await?))
}

pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path((user, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.tracker.mark_notification_read(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<StatusCode> {
    state.tracker.mark_all_read(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path((user, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.tracker.delete_notification(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
