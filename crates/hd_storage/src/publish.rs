use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use hd_core::{NewRecord, RecordStore, Result, SummaryPayload};
use tracing::debug;

pub const SUMMARY_HEADER: &str = "📝 核心要点:";
pub const ONE_LINER_HEADER: &str = "💡 EN One-liner:";
pub const BULLET: &str = "• ";

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub fn build_summary_block(summary_points: &[String], one_liner: &str) -> String {
    let bullets = summary_points
        .iter()
        .map(|point| format!("{}{}", BULLET, point))
        .collect::<Vec<_>>()
        .join("\n");
    if one_liner.trim().is_empty() {
        bullets
    } else {
        format!("{}\n{}\n\n{}\n{}", SUMMARY_HEADER, bullets, ONE_LINER_HEADER, one_liner.trim())
    }
}

pub fn build_record(payload: &SummaryPayload, date: NaiveDate) -> NewRecord {
    NewRecord {
        title: payload.title().to_string(),
        url: payload.url().to_string(),
        summary: build_summary_block(payload.summary_points(), payload.one_liner()),
        keywords: payload.keywords().iter().filter_map(|k| k.tag()).collect(),
        date,
        score: payload.score(),
    }
}

/// Writes payloads to the store. No duplicate check happens here.
pub struct Publisher {
    store: Arc<dyn RecordStore>,
    today: Clock,
}

impl Publisher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            today: Box::new(|| Utc::now().date_naive()),
        }
    }

    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub async fn publish(&self, payload: &SummaryPayload) -> Result<NewRecord> {
        let record = build_record(payload, (self.today)());
        self.store.create_record(&record).await?;
        debug!(store = self.store.name(), url = %record.url, "Record created");
        Ok(record)
    }
}
