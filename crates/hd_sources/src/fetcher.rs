//! HTTP retrieval with fixed-delay retries.
//!
//! Callers never see transport errors: every fetch either yields a value or
//! `None`, and `None` means "skip this one".

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use hd_core::{Error, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Bodies are cut off past this many bytes; the normalizer keeps far less.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const USER_AGENT: &str = concat!("hn-digest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a url. `Err` is reserved for transport failures; any status is `Ok`.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Read at most `limit` bytes of the body, dropping the rest.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            if chunk.len() > room {
                debug!(url = %response.url(), limit, "Body truncated");
            }
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = read_capped(response, self.max_body_bytes).await?;
        Ok(HttpResponse { status, body })
    }
}

pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(client: Arc<dyn HttpClient>, retries: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            retries,
            retry_delay,
        }
    }

    /// Fetch a document body. Transport errors and non-2xx statuses are both
    /// retried, `retries + 1` attempts in total.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let attempts = self.retries + 1;
        for attempt in 1..=attempts {
            debug!(%url, attempt, "Fetching document");
            let failure = match self.client.get(url).await {
                Ok(response) if response.is_success() => return Some(response.body),
                Ok(response) => Error::Transport(format!("status {}", response.status)),
                Err(e) => e,
            };
            warn!(%url, attempt, attempts, error = %failure, "Fetch attempt failed");
            if attempt < attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        warn!(%url, attempts, "Giving up on document");
        None
    }

    /// Fetch and decode a JSON document. Transport errors are retried; a
    /// non-2xx answer is final and yields `None` straight away.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let attempts = self.retries + 1;
        for attempt in 1..=attempts {
            match self.client.get(url).await {
                Ok(response) if response.is_success() => {
                    return match serde_json::from_str(&response.body) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            warn!(%url, error = %e, "Response is not the expected JSON");
                            None
                        }
                    };
                }
                Ok(response) => {
                    warn!(%url, status = response.status, "Metadata request rejected");
                    return None;
                }
                Err(e) => {
                    warn!(%url, attempt, attempts, error = %e, "Metadata fetch attempt failed");
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        None
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeHttp;
    use super::*;

    const URL: &str = "https://example.com/post";

    fn fetcher(http: Arc<FakeHttp>, retries: u32) -> Fetcher {
        Fetcher::new(http, retries, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_gives_up_after_retries_plus_one() {
        let http = Arc::new(FakeHttp::new().fail(URL));
        let body = fetcher(http.clone(), 2).fetch(URL).await;
        assert!(body.is_none());
        assert_eq!(http.call_count(URL), 3);
    }

    #[tokio::test]
    async fn test_retries_bad_status_for_documents() {
        let http = Arc::new(FakeHttp::new().status(URL, 503).ok(URL, "<p>hi</p>"));
        let body = fetcher(http.clone(), 2).fetch(URL).await;
        assert_eq!(body.as_deref(), Some("<p>hi</p>"));
        assert_eq!(http.call_count(URL), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let http = Arc::new(FakeHttp::new().fail(URL));
        assert!(fetcher(http.clone(), 0).fetch(URL).await.is_none());
        assert_eq!(http.call_count(URL), 1);
    }

    #[tokio::test]
    async fn test_json_status_is_not_retried() {
        let http = Arc::new(FakeHttp::new().status(URL, 404));
        let value: Option<Vec<u64>> = fetcher(http.clone(), 2).fetch_json(URL).await;
        assert!(value.is_none());
        assert_eq!(http.call_count(URL), 1);
    }

    #[tokio::test]
    async fn test_json_transport_errors_are_retried() {
        let http = Arc::new(FakeHttp::new().fail(URL).ok(URL, "[1, 2, 3]"));
        let value: Option<Vec<u64>> = fetcher(http.clone(), 2).fetch_json(URL).await;
        assert_eq!(value, Some(vec![1, 2, 3]));
        assert_eq!(http.call_count(URL), 2);
    }

    #[tokio::test]
    async fn test_json_decode_failure_is_none() {
        let http = Arc::new(FakeHttp::new().ok(URL, "<html>"));
        let value: Option<Vec<u64>> = fetcher(http.clone(), 2).fetch_json(URL).await;
        assert!(value.is_none());
        assert_eq!(http.call_count(URL), 1);
    }

    async fn serve_bodies() -> String {
        use axum::{routing::get, Router};

        let app = Router::new()
            .route("/big", get(|| async { "a".repeat(10_000) }))
            .route("/small", get(|| async { "<p>hello</p>" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_reqwest_client_caps_body() {
        let base = serve_bodies().await;
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let http = ReqwestClient::with_client(client).with_max_body_bytes(1024);

        let big = http.get(&format!("{}/big", base)).await.unwrap();
        assert_eq!(big.status, 200);
        assert_eq!(big.body.len(), 1024);

        let small = http.get(&format!("{}/small", base)).await.unwrap();
        assert_eq!(small.body, "<p>hello</p>");
    }
}
