use std::sync::Arc;
use std::time::Duration;
use hd_core::{LanguageModel, ModelBackend, ModelSettings, Result};
use tracing::info;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

pub const MODEL_TIMEOUT: Duration = Duration::from_secs(60);

pub fn create_model(settings: &ModelSettings) -> Result<Arc<dyn LanguageModel>> {
    let client = reqwest::Client::builder().timeout(MODEL_TIMEOUT).build()?;
    let model: Arc<dyn LanguageModel> = match settings.backend {
        ModelBackend::Gemini => Arc::new(GeminiModel::new(
            client,
            settings.api_key.clone(),
            settings.model.clone(),
        )),
        ModelBackend::OpenAi => Arc::new(OpenAiModel::new(
            client,
            settings.api_key.clone(),
            settings.model.clone(),
            settings
                .base_url
                .clone()
                .unwrap_or_else(|| hd_core::config::DEFAULT_OPENAI_BASE_URL.to_string()),
        )),
    };
    info!("🧠 Model backend {} ready (model {})", settings.backend, model.name());
    Ok(model)
}
