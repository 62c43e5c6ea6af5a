use async_trait::async_trait;
use crate::types::{NewRecord, RecordPage};
use crate::Result;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Create a record
    async fn create_record(&self, record: &NewRecord) -> Result<()>;

    /// Fetch one page of records sorted by date, newest first.
    /// `cursor` is the `next_cursor` of the previous page.
    async fn query_page(&self, page_size: usize, cursor: Option<&str>) -> Result<RecordPage>;

    /// Archive (soft delete) a record
    async fn archive_record(&self, page_id: &str) -> Result<()>;
}
