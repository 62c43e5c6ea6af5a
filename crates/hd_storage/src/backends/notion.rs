use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hd_core::{Error, NewRecord, RecordPage, RecordStore, Result, StoreRecord, StoreSettings};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::debug;

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";
pub const NOTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Notion rejects rich text runs longer than this.
const MAX_TEXT_RUN: usize = 2000;

pub struct NotionStore {
    client: Client,
    token: String,
    database_id: String,
    base_url: String,
}

impl fmt::Debug for NotionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionStore")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NotionStore {
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        let client = Client::builder().timeout(NOTION_TIMEOUT).build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &StoreSettings) -> Self {
        Self {
            client,
            token: settings.token.clone(),
            database_id: settings.database_id.clone(),
            base_url: NOTION_API_BASE.to_string(),
        }
    }

    /// Point the store at another API root, such as a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }
}

async fn failure_body(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    (status, response.text().await.unwrap_or_default())
}

#[async_trait]
impl RecordStore for NotionStore {
    fn name(&self) -> &str {
        "notion"
    }

    async fn create_record(&self, record: &NewRecord) -> Result<()> {
        let body = page_body(&self.database_id, record);
        let response = self
            .authorized(self.client.post(format!("{}/pages", self.base_url)))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = failure_body(response).await;
            return Err(Error::Publish { status, body });
        }
        Ok(())
    }

    async fn query_page(&self, page_size: usize, cursor: Option<&str>) -> Result<RecordPage> {
        let mut body = json!({
            "sorts": [{"property": "Date", "direction": "descending"}],
            "page_size": page_size,
        });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let response = self
            .authorized(self.client.post(format!(
                "{}/databases/{}/query",
                self.base_url, self.database_id
            )))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = failure_body(response).await;
            return Err(Error::Store(format!("query failed with status {}: {}", status, body)));
        }

        let value: Value = response.json().await?;
        let page = parse_query_response(&value);
        debug!(records = page.records.len(), has_more = page.has_more, "Fetched store page");
        Ok(page)
    }

    async fn archive_record(&self, page_id: &str) -> Result<()> {
        let response = self
            .authorized(self.client.patch(format!("{}/pages/{}", self.base_url, page_id)))
            .json(&json!({"archived": true}))
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = failure_body(response).await;
            return Err(Error::Store(format!(
                "archiving {} failed with status {}: {}",
                page_id, status, body
            )));
        }
        Ok(())
    }
}

fn rich_text(content: &str) -> Value {
    let chars: Vec<char> = content.chars().collect();
    let runs: Vec<Value> = chars
        .chunks(MAX_TEXT_RUN)
        .map(|chunk| json!({"text": {"content": chunk.iter().collect::<String>()}}))
        .collect();
    Value::Array(runs)
}

pub(crate) fn page_body(database_id: &str, record: &NewRecord) -> Value {
    // Commas are not allowed in select option names.
    let keywords: Vec<Value> = record
        .keywords
        .iter()
        .map(|k| json!({"name": k.replace(',', " ")}))
        .collect();

    json!({
        "parent": {"database_id": database_id},
        "properties": {
            "Title": {"title": rich_text(&record.title)},
            "URL": {"url": record.url},
            "Summary": {"rich_text": rich_text(&record.summary)},
            "Keywords": {"multi_select": keywords},
            "Date": {"date": {"start": record.date.to_string()}},
            "Score": {"number": record.score},
        }
    })
}

pub(crate) fn parse_query_response(value: &Value) -> RecordPage {
    RecordPage {
        records: value["results"]
            .as_array()
            .map(|pages| pages.iter().map(parse_page).collect())
            .unwrap_or_default(),
        has_more: value["has_more"].as_bool().unwrap_or(false),
        next_cursor: value["next_cursor"].as_str().map(str::to_string),
    }
}

fn plain_text(runs: &Value) -> String {
    runs.as_array()
        .map(|runs| {
            runs.iter()
                .filter_map(|r| r["plain_text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_page(page: &Value) -> StoreRecord {
    let props = &page["properties"];
    StoreRecord {
        page_id: page["id"].as_str().unwrap_or_default().to_string(),
        title: plain_text(&props["Title"]["title"]),
        url: props["URL"]["url"].as_str().unwrap_or_default().to_string(),
        summary: plain_text(&props["Summary"]["rich_text"]),
        keywords: props["Keywords"]["multi_select"]
            .as_array()
            .map(|opts| {
                opts.iter()
                    .filter_map(|o| o["name"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        date: props["Date"]["date"]["start"]
            .as_str()
            .and_then(|s| s.get(..10))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        score: props["Score"]["number"].as_f64().map(|n| n as i64).unwrap_or(0),
        created_time: page["created_time"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use axum::{extract::State, Router};
    use std::sync::{Arc, Mutex};

    const REJECTION: &str = r#"{"object":"error","status":400,"code":"validation_error","message":"URL is not a url"}"#;

    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        path: String,
        auth: String,
        version: String,
        body: Value,
    }

    type Log = Arc<Mutex<Vec<Seen>>>;

    fn header(headers: &HeaderMap, name: &str) -> String {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// Records every call. Page creation is rejected, queries return one page.
    async fn fake_notion(
        State(log): State<Log>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let path = uri.path().to_string();
        log.lock().unwrap().push(Seen {
            method: method.clone(),
            path: path.clone(),
            auth: header(&headers, "authorization"),
            version: header(&headers, "notion-version"),
            body: serde_json::from_str(&body).unwrap_or(Value::Null),
        });

        if method == Method::POST && path == "/pages" {
            (StatusCode::BAD_REQUEST, REJECTION.to_string())
        } else if method == Method::POST && path.ends_with("/query") {
            let page = json!({
                "results": [{
                    "id": "page-1",
                    "properties": {"URL": {"url": "https://thing.dev"}, "Date": {"date": {"start": "2024-03-09"}}}
                }],
                "has_more": true,
                "next_cursor": "cursor-2"
            });
            (StatusCode::OK, page.to_string())
        } else {
            (StatusCode::OK, "{}".to_string())
        }
    }

    async fn serve_fake() -> (NotionStore, Log) {
        let log: Log = Arc::default();
        let app = Router::new().fallback(fake_notion).with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let settings = StoreSettings {
            token: "secret-token".to_string(),
            database_id: "db-1".to_string(),
        };
        let client = Client::builder().no_proxy().build().unwrap();
        let store = NotionStore::with_client(client, &settings).with_base_url(format!("http://{}/", addr));
        (store, log)
    }

    #[tokio::test]
    async fn test_rejected_create_carries_raw_body() {
        let (store, log) = serve_fake().await;

        let err = store.create_record(&record()).await.unwrap_err();
        match err {
            Error::Publish { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, REJECTION);
            }
            other => panic!("expected a publish error, got {:?}", other),
        }

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].auth, "Bearer secret-token");
        assert_eq!(seen[0].version, NOTION_VERSION);
        assert_eq!(seen[0].body["parent"]["database_id"], json!("db-1"));
    }

    #[tokio::test]
    async fn test_query_sends_sort_and_cursor() {
        let (store, log) = serve_fake().await;

        let page = store.query_page(100, Some("cursor-1")).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].url, "https://thing.dev");
        assert_eq!(page.next_cursor.as_deref(), Some("cursor-2"));

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].path, "/databases/db-1/query");
        assert_eq!(seen[0].auth, "Bearer secret-token");
        assert_eq!(seen[0].version, NOTION_VERSION);
        assert_eq!(seen[0].body["page_size"], json!(100));
        assert_eq!(seen[0].body["start_cursor"], json!("cursor-1"));
        assert_eq!(seen[0].body["sorts"][0], json!({"property": "Date", "direction": "descending"}));
    }

    #[tokio::test]
    async fn test_archive_patches_page() {
        let (store, log) = serve_fake().await;

        store.archive_record("page-7").await.unwrap();

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::PATCH);
        assert_eq!(seen[0].path, "/pages/page-7");
        assert_eq!(seen[0].auth, "Bearer secret-token");
        assert_eq!(seen[0].version, NOTION_VERSION);
        assert_eq!(seen[0].body, json!({"archived": true}));
    }

    fn record() -> NewRecord {
        NewRecord {
            title: "Show HN: A thing".to_string(),
            url: "https://thing.dev".to_string(),
            summary: "• 一\n• 二".to_string(),
            keywords: vec!["Rust · 一种语言".to_string(), "a, b".to_string()],
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            score: 4,
        }
    }

    #[test]
    fn test_page_body_properties() {
        let body = page_body("db-1", &record());
        assert_eq!(body["parent"]["database_id"], json!("db-1"));
        let props = &body["properties"];
        assert_eq!(props["Title"]["title"][0]["text"]["content"], json!("Show HN: A thing"));
        assert_eq!(props["URL"]["url"], json!("https://thing.dev"));
        assert_eq!(props["Summary"]["rich_text"][0]["text"]["content"], json!("• 一\n• 二"));
        assert_eq!(
            props["Keywords"]["multi_select"],
            json!([{"name": "Rust · 一种语言"}, {"name": "a  b"}])
        );
        assert_eq!(props["Date"]["date"]["start"], json!("2024-03-09"));
        assert_eq!(props["Score"]["number"], json!(4));
    }

    #[test]
    fn test_long_text_is_split_into_runs() {
        let runs = rich_text(&"字".repeat(MAX_TEXT_RUN + 10));
        let runs = runs.as_array().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1]["text"]["content"].as_str().unwrap().chars().count(), 10);
    }

    #[test]
    fn test_parse_page() {
        let page = json!({
            "id": "page-1",
            "created_time": "2024-03-09T08:15:00.000Z",
            "properties": {
                "Title": {"title": [{"plain_text": "Part one, "}, {"plain_text": "part two"}]},
                "URL": {"url": "https://thing.dev"},
                "Summary": {"rich_text": [{"plain_text": "• a"}]},
                "Keywords": {"multi_select": [{"name": "Rust"}, {"name": "GC · 垃圾回收"}]},
                "Date": {"date": {"start": "2024-03-09"}},
                "Score": {"number": 4.0}
            }
        });
        let record = parse_page(&page);
        assert_eq!(record.page_id, "page-1");
        assert_eq!(record.title, "Part one, part two");
        assert_eq!(record.url, "https://thing.dev");
        assert_eq!(record.keywords, vec!["Rust", "GC · 垃圾回收"]);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(record.score, 4);
        assert!(record.created_time.is_some());
    }

    #[test]
    fn test_parse_sparse_page() {
        let page = json!({
            "id": "page-2",
            "properties": {
                "URL": {"url": null},
                "Date": {"date": null},
                "Score": {"number": null}
            }
        });
        let record = parse_page(&page);
        assert_eq!(record.url, "");
        assert_eq!(record.title, "");
        assert!(record.keywords.is_empty());
        assert_eq!(record.date, None);
        assert_eq!(record.score, 0);
    }

    #[test]
    fn test_parse_query_response() {
        let value = json!({
            "results": [{"id": "a", "properties": {}}, {"id": "b", "properties": {}}],
            "has_more": true,
            "next_cursor": "cursor-2"
        });
        let page = parse_query_response(&value);
        assert_eq!(page.records.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("cursor-2"));

        let page = parse_query_response(&json!({"results": [], "has_more": false, "next_cursor": null}));
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }
}
