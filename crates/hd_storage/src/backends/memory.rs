use std::cmp::Reverse;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use hd_core::{Error, NewRecord, RecordPage, RecordStore, Result, StoreRecord};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    records: Vec<StoreRecord>,
    archived: Vec<String>,
    next_id: usize,
}

/// In-process store with the same paging contract as the hosted one.
/// Cursors are plain offsets.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoreRecord>) -> Self {
        let next_id = records.len();
        Self {
            state: Arc::new(RwLock::new(MemoryState {
                records,
                archived: Vec::new(),
                next_id,
            })),
        }
    }

    /// Live records in insertion order
    pub async fn records(&self) -> Vec<StoreRecord> {
        let state = self.state.read().await;
        state
            .records
            .iter()
            .filter(|r| !state.archived.contains(&r.page_id))
            .cloned()
            .collect()
    }

    pub async fn archived_ids(&self) -> Vec<String> {
        self.state.read().await.archived.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_record(&self, record: &NewRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let page_id = format!("mem-{}", state.next_id);
        state.records.push(StoreRecord {
            page_id,
            title: record.title.clone(),
            url: record.url.clone(),
            summary: record.summary.clone(),
            keywords: record.keywords.clone(),
            date: Some(record.date),
            score: i64::from(record.score),
            created_time: Some(Utc::now()),
        });
        Ok(())
    }

    async fn query_page(&self, page_size: usize, cursor: Option<&str>) -> Result<RecordPage> {
        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| Error::Store(format!("invalid cursor: {}", c)))?,
            None => 0,
        };

        let mut live = self.records().await;
        // Stable: equal dates keep insertion order.
        live.sort_by_key(|r| Reverse(r.date));

        let page: Vec<StoreRecord> = live.iter().skip(offset).take(page_size).cloned().collect();
        let end = offset + page.len();
        let has_more = end < live.len();
        Ok(RecordPage {
            records: page,
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }

    async fn archive_record(&self, page_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.records.iter().any(|r| r.page_id == page_id) {
            return Err(Error::Store(format!("no such record: {}", page_id)));
        }
        if !state.archived.iter().any(|id| id == page_id) {
            state.archived.push(page_id.to_string());
        }
        Ok(())
    }
}
