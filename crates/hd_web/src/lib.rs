use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/articles", get(handlers::list_articles))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, AppState};
    pub use hd_core::{ArticleView, Result, Error};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use hd_core::{Error, NewRecord, RecordPage, RecordStore, Result, StoreRecord};
    use hd_storage::MemoryStore;
    use serde_json::Value;
    use tower::ServiceExt as _;

    const BODY_LIMIT: usize = 1024 * 1024;

    struct DownStore;

    #[async_trait]
    impl RecordStore for DownStore {
        fn name(&self) -> &str {
            "down"
        }

        async fn create_record(&self, _record: &NewRecord) -> Result<()> {
            Err(Error::Store("offline".to_string()))
        }

        async fn query_page(&self, _page_size: usize, _cursor: Option<&str>) -> Result<RecordPage> {
            Err(Error::Store("offline".to_string()))
        }

        async fn archive_record(&self, _page_id: &str) -> Result<()> {
            Err(Error::Store("offline".to_string()))
        }
    }

    fn record(id: &str, url: &str, day: u32) -> StoreRecord {
        StoreRecord {
            page_id: id.to_string(),
            title: format!("Story {}", id),
            url: url.to_string(),
            summary: "• point".to_string(),
            keywords: vec!["Rust · 锈".to_string()],
            date: NaiveDate::from_ymd_opt(2024, 2, day),
            score: 4,
            ..Default::default()
        }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_articles_are_deduplicated() {
        let store = MemoryStore::with_records(vec![
            record("1", "https://a.dev", 1),
            record("2", "https://a.dev", 2),
            record("3", "https://b.dev", 3),
            record("4", "", 4),
        ]);
        let app = create_app(AppState::new(Arc::new(store)));

        let (status, body) = get(app, "/api/articles").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        let articles = json.as_array().unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0]["url"], "https://b.dev");
        assert_eq!(articles[1]["title"], "Story 2");
        assert_eq!(articles[1]["date"], "2024-02-02");
        assert_eq!(articles[1]["score"], 4);
        assert_eq!(articles[1]["keywords"][0], "Rust · 锈");
    }

    #[tokio::test]
    async fn test_store_failure_returns_empty_list() {
        let app = create_app(AppState::new(Arc::new(DownStore)));
        let (status, body) = get(app, "/api/articles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let app = create_app(AppState::new(Arc::new(MemoryStore::new())));
        let (status, body) = get(app.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/api/articles"));

        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }
}
