pub mod config;
pub mod dedup;
pub mod error;
pub mod inference;
pub mod storage;
pub mod types;

pub use config::{ModelBackend, ModelSettings, Settings, StoreSettings};
pub use error::{Error, Result};
pub use inference::{Candidate, GenerationRequest, LanguageModel, ModelResponse, ResponseShape};
pub use storage::RecordStore;
pub use types::{ArticleView, Keyword, NewRecord, RecordPage, StoreRecord, StoryCandidate, SummaryPayload};
