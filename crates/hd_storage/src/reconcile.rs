//! Out-of-band cleanup of records that share a url.
//!
//! The newest record of every url survives; the rest are archived. Nothing is
//! archived without the caller's confirmation.

use std::cmp::Reverse;
use std::sync::Arc;
use hd_core::dedup::redundant;
use hd_core::{RecordStore, Result, StoreRecord};
use tracing::{error, info, warn};

pub const PAGE_SIZE: usize = 100;
const LISTING_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records read from the store
    pub examined: usize,
    /// Records marked for archiving
    pub duplicates: usize,
    pub archived: usize,
    pub failed: usize,
}

pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    page_size: usize,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Read every record, following cursors until the store reports no more pages.
    pub async fn fetch_all(&self) -> Result<Vec<StoreRecord>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.store.query_page(self.page_size, cursor.as_deref()).await?;
            records.extend(page.records);
            if !page.has_more {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    warn!("Store reported more pages without a cursor; stopping");
                    break;
                }
            }
        }
        Ok(records)
    }

    /// Scan the store and archive duplicates once `confirm` agrees.
    /// `confirm` is only called when there is something to archive.
    pub async fn reconcile<F>(&self, confirm: F) -> Result<ReconcileReport>
    where
        F: FnOnce(&[StoreRecord]) -> bool,
    {
        info!("🔍 Fetching all records from {}", self.store.name());
        let mut records = self.fetch_all().await?;
        canonical_order(&mut records);

        let doomed: Vec<StoreRecord> = redundant(&records).into_iter().cloned().collect();
        let mut report = ReconcileReport {
            examined: records.len(),
            duplicates: doomed.len(),
            ..Default::default()
        };
        info!(examined = report.examined, duplicates = report.duplicates, "Scan complete");

        if doomed.is_empty() {
            info!("✨ No duplicates found, all records are unique");
            return Ok(report);
        }

        for record in &doomed {
            info!("  - {}", describe(record));
        }
        if !confirm(&doomed) {
            info!("Cancelled, nothing archived");
            return Ok(report);
        }

        for record in &doomed {
            match self.store.archive_record(&record.page_id).await {
                Ok(()) => {
                    report.archived += 1;
                    info!(page_id = %record.page_id, "✓ Archived duplicate");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(page_id = %record.page_id, url = %record.url, error = %e, "✗ Failed to archive duplicate");
                }
            }
        }

        info!(
            attempted = report.duplicates,
            archived = report.archived,
            failed = report.failed,
            "Reconciliation finished"
        );
        Ok(report)
    }
}

/// Newest first by date, then by creation time, then by page id, so the
/// canonical record does not depend on how the store breaks ties.
pub fn canonical_order(records: &mut [StoreRecord]) {
    records.sort_by(|a, b| {
        Reverse(a.date)
            .cmp(&Reverse(b.date))
            .then_with(|| Reverse(a.created_time).cmp(&Reverse(b.created_time)))
            .then_with(|| a.page_id.cmp(&b.page_id))
    });
}

/// One listing line: truncated title and url.
pub fn describe(record: &StoreRecord) -> String {
    format!(
        "{}... ({}...)",
        truncate(&record.title, LISTING_WIDTH),
        truncate(&record.url, LISTING_WIDTH)
    )
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
