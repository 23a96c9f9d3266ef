use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod behavior;
pub mod handlers;
pub mod state;

pub use behavior::BehaviorTracker;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/news/fetch", post(handlers::fetch_news))
        .route("/api/news/refresh", post(handlers::refresh_news))
        .route("/api/search", get(handlers::search))
        .route("/api/summarize", post(handlers::summarize))
        .route(
            "/api/users/:user/bookmarks",
            get(handlers::list_bookmarks)
                .post(handlers::add_bookmark)
                .delete(handlers::remove_bookmark),
        )
        .route(
            "/api/users/:user/ratings",
            get(handlers::list_ratings).put(handlers::rate_article),
        )
        .route(
            "/api/users/:user/history",
            get(handlers::reading_history).post(handlers::record_read),
        )
        .route("/api/users/:user/events", post(handlers::record_event))
        .route(
            "/api/users/:user/notifications",
            get(handlers::list_notifications),
        )
        .route(
            "/api/users/:user/notifications/read_all",
            post(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/users/:user/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .route(
            "/api/users/:user/notifications/:id",
            delete(handlers::delete_notification),
        )
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::AppState;
    pub use ns_core::{Article, Error, Result};
}
