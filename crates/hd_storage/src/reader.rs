use hd_core::dedup::dedupe;
use hd_core::{ArticleView, RecordStore, Result};
use tracing::debug;

use crate::reconcile::canonical_order;

pub const READ_PAGE_SIZE: usize = 50;

/// Most recent records from a single page, one per url.
pub async fn recent_articles(store: &dyn RecordStore, limit: usize) -> Result<Vec<ArticleView>> {
    let page = store.query_page(limit, None).await?;
    let mut records = page.records;
    canonical_order(&mut records);
    let fetched = records.len();
    let unique = dedupe(records);
    debug!(fetched, unique = unique.len(), "Loaded recent articles");
    Ok(unique.into_iter().map(ArticleView::from).collect())
}
