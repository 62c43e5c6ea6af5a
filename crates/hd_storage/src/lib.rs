use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use hd_core::{Error, RecordStore, Result, Settings};
use tracing::info;

pub mod backends;
pub mod publish;
pub mod reader;
pub mod reconcile;

pub use backends::*;
pub use publish::Publisher;
pub use reader::{recent_articles, READ_PAGE_SIZE};
pub use reconcile::{ReconcileReport, Reconciler};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Notion,
    Memory,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notion" => Ok(Self::Notion),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Configuration(format!("Unknown store: {}", other))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notion => write!(f, "notion"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Build the selected store. Notion credentials are resolved here so a
/// missing variable fails before any work starts.
pub fn create_store(kind: StoreKind, settings: &Settings) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match kind {
        StoreKind::Notion => Arc::new(NotionStore::new(&settings.store()?)?),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    info!("💾 Using {} store", store.name());
    Ok(store)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_store, Publisher, Reconciler, StoreKind};
}
