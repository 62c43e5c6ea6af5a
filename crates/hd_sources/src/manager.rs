use std::sync::Arc;
use hd_core::{Error, NewRecord, Result, StoryCandidate};
use hd_inference::Summarizer;
use hd_storage::Publisher;
use tracing::{error, info, warn};

use crate::fetcher::Fetcher;
use crate::hackernews::StorySource;
use crate::normalize::normalize_html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Body could not be fetched after all retries
    Unreachable,
    /// Body fetched but no readable text survived normalization
    NoText,
}

#[derive(Debug)]
pub enum CandidateOutcome {
    Published(NewRecord),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub candidates: usize,
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drives one digest run: discover, fetch, normalize, summarize, publish.
/// Candidates are handled one at a time in ranking order.
pub struct DigestManager {
    source: Arc<dyn StorySource>,
    fetcher: Arc<Fetcher>,
    summarizer: Summarizer,
    publisher: Publisher,
}

impl DigestManager {
    pub fn new(
        source: Arc<dyn StorySource>,
        fetcher: Arc<Fetcher>,
        summarizer: Summarizer,
        publisher: Publisher,
    ) -> Self {
        Self {
            source,
            fetcher,
            summarizer,
            publisher,
        }
    }

    pub async fn process_candidate(&self, candidate: &StoryCandidate) -> Result<CandidateOutcome> {
        info!(story_id = candidate.id, "📰 Processing: {}", candidate.title);

        let Some(html) = self.fetcher.fetch(&candidate.url).await else {
            return Ok(CandidateOutcome::Skipped(SkipReason::Unreachable));
        };

        let body = normalize_html(&html);
        if body.is_empty() {
            return Ok(CandidateOutcome::Skipped(SkipReason::NoText));
        }

        info!(story_id = candidate.id, model = self.summarizer.model_name(), "🤖 Summarizing");
        let payload = self
            .summarizer
            .summarize(&candidate.title, &body)
            .await?
            .with_url(&candidate.url);

        let record = self.publisher.publish(&payload).await?;
        info!(story_id = candidate.id, score = record.score, "✅ Published: {}", record.title);
        Ok(CandidateOutcome::Published(record))
    }

    /// Process up to `limit` candidates. Only fatal errors end the run early.
    pub async fn run(&self, limit: usize) -> Result<RunReport> {
        let candidates = self.source.top_candidates(limit).await;
        let mut report = RunReport {
            candidates: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            warn!("No candidates from {}", self.source.name());
        }

        for candidate in &candidates {
            match self.process_candidate(candidate).await {
                Ok(CandidateOutcome::Published(_)) => report.published += 1,
                Ok(CandidateOutcome::Skipped(reason)) => {
                    report.skipped += 1;
                    warn!(
                        story_id = candidate.id,
                        title = %candidate.title,
                        url = %candidate.url,
                        ?reason,
                        "Skipped candidate"
                    );
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    report.failed += 1;
                    log_failure(candidate, &e);
                }
            }
        }

        info!(
            processed = report.published,
            skipped = report.skipped,
            failed = report.failed,
            "🎉 Digest finished: {}/{} published",
            report.published,
            report.candidates
        );
        Ok(report)
    }
}

fn log_failure(candidate: &StoryCandidate, e: &Error) {
    let kind = match e {
        Error::Summarization(_) | Error::Validation(_) => "summarization",
        Error::Publish { .. } => "publish",
        _ => "unexpected",
    };
    error!(
        story_id = candidate.id,
        title = %candidate.title,
        url = %candidate.url,
        kind,
        error = %e,
        "❌ Candidate failed"
    );
}
