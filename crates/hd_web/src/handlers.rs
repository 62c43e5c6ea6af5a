use axum::{extract::State, response::Html, response::IntoResponse, Json};
use std::sync::Arc;
use hd_core::ArticleView;
use hd_storage::{recent_articles, READ_PAGE_SIZE};
use tracing::error;
use crate::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Newest articles, one per url. Store failures degrade to an empty list.
pub async fn list_articles(State(state): State<Arc<AppState>>) -> Json<Vec<ArticleView>> {
    match recent_articles(state.store.as_ref(), READ_PAGE_SIZE).await {
        Ok(articles) => Json(articles),
        Err(e) => {
            error!(store = state.store.name(), error = %e, "Error fetching articles");
            Json(Vec::new())
        }
    }
}

pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

pub async fn health() -> &'static str {
    "OK"
}
