use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MAX_SUMMARY_POINTS: usize = 3;
pub const MAX_KEYWORDS: usize = 2;
pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;
pub const DEFAULT_SCORE: i64 = 3;

/// A ranked story with enough metadata to be fetched and summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryCandidate {
    pub id: u64,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    #[serde(default, alias = "term_en")]
    pub term_source: String,
    #[serde(default, alias = "term_zh")]
    pub term_translated: String,
}

impl Keyword {
    pub fn new(term_source: impl Into<String>, term_translated: impl Into<String>) -> Self {
        Self {
            term_source: term_source.into(),
            term_translated: term_translated.into(),
        }
    }

    /// Tag text for the store: both halves joined by a middle dot, or whichever half exists.
    pub fn tag(&self) -> Option<String> {
        let source = self.term_source.trim();
        let translated = self.term_translated.trim();
        match (source.is_empty(), translated.is_empty()) {
            (false, false) => Some(format!("{} · {}", source, translated)),
            (false, true) => Some(source.to_string()),
            (true, false) => Some(translated.to_string()),
            (true, true) => None,
        }
    }
}

/// Validated result of summarizing one candidate.
///
/// Built once through [`SummaryPayload::new`], which caps the summary points and
/// keywords and clamps the score; the only later change is attaching the url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPayload {
    title: String,
    url: String,
    summary_points: Vec<String>,
    keywords: Vec<Keyword>,
    one_liner: String,
    score: u8,
}

impl SummaryPayload {
    pub fn new(
        title: impl Into<String>,
        mut summary_points: Vec<String>,
        mut keywords: Vec<Keyword>,
        one_liner: impl Into<String>,
        score: i64,
    ) -> Result<Self> {
        summary_points.truncate(MAX_SUMMARY_POINTS);
        if summary_points.is_empty() {
            return Err(Error::Validation(
                "model response missing summary_points".to_string(),
            ));
        }
        keywords.truncate(MAX_KEYWORDS);

        Ok(Self {
            title: title.into(),
            url: String::new(),
            summary_points,
            keywords,
            one_liner: one_liner.into(),
            score: score.clamp(MIN_SCORE, MAX_SCORE) as u8,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn summary_points(&self) -> &[String] {
        &self.summary_points
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn one_liner(&self) -> &str {
        &self.one_liner
    }

    pub fn score(&self) -> u8 {
        self.score
    }
}

/// A record as it will be written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub date: NaiveDate,
    pub score: u8,
}

/// A record as read back from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub page_id: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub date: Option<NaiveDate>,
    pub score: i64,
    pub created_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<StoreRecord>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Shape served to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleView {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub date: String,
    pub score: i64,
}

impl From<StoreRecord> for ArticleView {
    fn from(record: StoreRecord) -> Self {
        Self {
            title: record.title,
            url: record.url,
            summary: record.summary,
            keywords: record.keywords,
            date: record.date.map(|d| d.to_string()).unwrap_or_default(),
            score: record.score,
        }
    }
}
