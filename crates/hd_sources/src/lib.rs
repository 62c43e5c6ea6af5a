pub mod fetcher;
pub mod hackernews;
pub mod manager;
pub mod normalize;

pub use fetcher::{Fetcher, HttpClient, HttpResponse, ReqwestClient};
pub use hackernews::{HackerNewsSource, StorySource};
pub use manager::{CandidateOutcome, DigestManager, RunReport, SkipReason};
pub use normalize::normalize_html;

pub mod prelude {
    pub use super::{DigestManager, Fetcher, HackerNewsSource, StorySource};
    pub use hd_core::{Error, Result, StoryCandidate};
}
