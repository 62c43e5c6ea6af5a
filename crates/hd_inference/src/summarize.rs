use std::sync::Arc;
use hd_core::types::DEFAULT_SCORE;
use hd_core::{Error, GenerationRequest, Keyword, LanguageModel, Result, SummaryPayload};
use serde_json::Value;
use tracing::debug;

use crate::response::{extract_json, extract_text};

pub const TEMPERATURE: f32 = 0.4;
pub const MAX_OUTPUT_TOKENS: u32 = 256;

pub const SUMMARY_PROMPT: &str = "\
You are an assistant who summarizes technical articles for bilingual learners.
Return ONLY valid JSON with the following schema:
{
  \"summary_points\": [\"3 concise Chinese bullet points\"],
  \"keywords\": [{\"term_en\": \"English term\", \"term_zh\": \"Chinese explanation\"}],
  \"one_liner\": \"English one sentence summary\",
  \"score\": 1-5 integer
}
Do not add markdown fences. Keep wording beginner-friendly.";

pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// The article url is deliberately not part of the request.
    pub fn request(title: &str, body: &str) -> GenerationRequest {
        GenerationRequest {
            segments: vec![
                SUMMARY_PROMPT.to_string(),
                format!("Article title: {}", title),
                "Article body:".to_string(),
                body.to_string(),
            ],
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            json_output: true,
        }
    }

    /// Summarize one article. The returned payload has an empty url.
    pub async fn summarize(&self, title: &str, body: &str) -> Result<SummaryPayload> {
        let response = self.model.generate(&Self::request(title, body)).await?;
        let text = extract_text(&response)?;
        debug!(model = self.model.name(), chars = text.len(), "Model answered");
        let value = extract_json(&text)?;
        payload_from_json(title, &value)
    }
}

/// Validate a decoded model answer into a payload.
pub fn payload_from_json(title: &str, value: &Value) -> Result<SummaryPayload> {
    let Value::Object(fields) = value else {
        return Err(Error::Summarization(format!(
            "expected a JSON object from the model, got {}",
            kind(value)
        )));
    };

    let summary_points = match fields.get("summary_points") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    };

    let keywords = match fields.get("keywords") {
        Some(Value::Array(items)) => items.iter().filter_map(keyword_from_json).collect(),
        _ => Vec::new(),
    };

    let one_liner = fields
        .get("one_liner")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    SummaryPayload::new(title, summary_points, keywords, one_liner, coerce_score(fields.get("score")))
}

/// Either half may be missing, null or not a string; it then counts as empty.
fn keyword_from_json(value: &Value) -> Option<Keyword> {
    match value {
        Value::Object(fields) => {
            let half = |names: [&str; 2]| {
                names
                    .iter()
                    .find_map(|name| fields.get(*name).and_then(Value::as_str))
                    .map(str::trim)
                    .unwrap_or_default()
            };
            Some(Keyword::new(
                half(["term_source", "term_en"]),
                half(["term_translated", "term_zh"]),
            ))
        }
        Value::String(s) => Some(Keyword::new(s.trim(), "")),
        _ => None,
    }
}

/// Integers pass through, floats truncate toward zero, numeric strings are
/// parsed; anything else is the default. Range clamping happens in the payload.
pub fn coerce_score(value: Option<&Value>) -> i64 {
    let from_f64 = |f: f64| if f.is_finite() { Some(f.trunc() as i64) } else { None };
    let score = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(from_f64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(from_f64))
        }
        _ => None,
    };
    score.unwrap_or(DEFAULT_SCORE)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
