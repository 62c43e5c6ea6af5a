pub mod models;
pub mod response;
pub mod summarize;

pub use models::create_model;
pub use response::{extract_json, extract_text};
pub use summarize::{payload_from_json, Summarizer};

pub mod prelude {
    pub use super::models::create_model;
    pub use super::summarize::Summarizer;
    pub use hd_core::{Error, LanguageModel, Result, SummaryPayload};
}
