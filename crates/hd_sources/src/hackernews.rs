use std::sync::Arc;
use async_trait::async_trait;
use hd_core::StoryCandidate;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use crate::fetcher::Fetcher;

pub const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
pub const DEFAULT_LIMIT: usize = 5;

#[async_trait]
pub trait StorySource: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` candidates, most relevant first
    async fn top_candidates(&self, limit: usize) -> Vec<StoryCandidate>;
}

#[derive(Debug, Deserialize)]
struct StoryItem {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl StoryItem {
    fn into_candidate(self) -> Option<StoryCandidate> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let url = self.url.map(|u| u.trim().to_string()).filter(|u| is_fetchable(u))?;
        Some(StoryCandidate { id: self.id, title, url })
    }
}

fn is_fetchable(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub struct HackerNewsSource {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl HackerNewsSource {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self::with_base_url(fetcher, HN_API_BASE)
    }

    pub fn with_base_url(fetcher: Arc<Fetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn top_stories_url(&self) -> String {
        format!("{}/topstories.json", self.base_url)
    }

    pub fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }
}

#[async_trait]
impl StorySource for HackerNewsSource {
    fn name(&self) -> &str {
        "Hacker News"
    }

    async fn top_candidates(&self, limit: usize) -> Vec<StoryCandidate> {
        info!("📰 Fetching top stories from {}", self.name());
        let Some(mut ids) = self.fetcher.fetch_json::<Vec<u64>>(&self.top_stories_url()).await else {
            error!("Could not fetch the ranked story list");
            return Vec::new();
        };
        ids.truncate(limit);

        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            // Deleted items come back as `null`.
            let Some(item) = self
                .fetcher
                .fetch_json::<Option<StoryItem>>(&self.item_url(id))
                .await
                .flatten()
            else {
                continue;
            };
            match item.into_candidate() {
                Some(candidate) => candidates.push(candidate),
                None => info!(story_id = id, "Skipping story due to missing title or URL"),
            }
        }
        candidates
    }
}
