use std::collections::BTreeSet;
use async_trait::async_trait;
use crate::Result;

/// One request to a model backend. `segments` are sent as separate message parts.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub segments: Vec<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub json_output: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Textual parts of the candidate content, in order
    pub parts: Vec<String>,
    pub finish_reason: Option<String>,
}

/// Backend response before any interpretation.
///
/// `text` is the backend's aggregated text when it offers one; `candidates`
/// is the raw per-candidate content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    DirectText(String),
    Parts(Vec<String>),
    Empty { finish_reasons: BTreeSet<String> },
}

impl ModelResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            candidates: Vec::new(),
        }
    }

    pub fn shape(&self) -> ResponseShape {
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return ResponseShape::DirectText(text.to_string());
        }

        let parts: Vec<String> = self
            .candidates
            .iter()
            .flat_map(|c| c.parts.iter())
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if !parts.is_empty() {
            return ResponseShape::Parts(parts);
        }

        ResponseShape::Empty {
            finish_reasons: self
                .candidates
                .iter()
                .filter_map(|c| c.finish_reason.clone())
                .collect(),
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Run a single generation request
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse>;
}
