use std::fmt;
use async_trait::async_trait;
use hd_core::{Candidate, Error, GenerationRequest, LanguageModel, ModelResponse, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Any backend speaking the OpenAI chat completions protocol (OpenAI, DeepSeek, ...).
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiModel {
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatRequest {
        // The first segment is the instruction, the rest is material.
        let mut segments = request.segments.iter();
        let mut messages = Vec::with_capacity(request.segments.len());
        if let Some(instruction) = segments.next() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: instruction.clone(),
            });
        }
        messages.extend(segments.map(|s| ChatMessage {
            role: "user".to_string(),
            content: s.clone(),
        }));

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            response_format: request.json_output.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        }
    }
}

fn into_model_response(response: ChatResponse) -> ModelResponse {
    let candidates: Vec<Candidate> = response
        .choices
        .into_iter()
        .map(|choice| Candidate {
            parts: choice.message.and_then(|m| m.content).into_iter().collect(),
            finish_reason: choice.finish_reason,
        })
        .collect();
    let text = candidates.first().and_then(|c| c.parts.first()).cloned();
    ModelResponse { text, candidates }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.build_request(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("{} returned {}: {}", self.base_url, status, body)));
        }

        Ok(into_model_response(response.json::<ChatResponse>().await?))
    }
}
