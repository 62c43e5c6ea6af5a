//! Process settings, read once at startup.
//!
//! Nothing below the binary reads the environment; components receive the
//! pieces they need from [`Settings`].

use std::fmt;
use std::str::FromStr;
use crate::{Error, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelBackend {
    #[default]
    Gemini,
    OpenAi,
}

impl FromStr for ModelBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ModelBackend::Gemini),
            "openai" => Ok(ModelBackend::OpenAi),
            other => Err(Error::Configuration(format!("Unknown model backend: {}", other))),
        }
    }
}

impl fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelBackend::Gemini => write!(f, "gemini"),
            ModelBackend::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Clone)]
pub struct StoreSettings {
    pub token: String,
    pub database_id: String,
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .finish()
    }
}

#[derive(Clone)]
pub struct ModelSettings {
    pub backend: ModelBackend,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("backend", &self.backend)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct Settings {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    openai_model: Option<String>,
    notion_token: Option<String>,
    notion_database_id: Option<String>,
    port: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Settings")
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("notion_token", &redact(&self.notion_token))
            .field("notion_database_id", &self.notion_database_id)
            .field("port", &self.port)
            .finish()
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            openai_model: get("OPENAI_MODEL"),
            notion_token: get("NOTION_TOKEN"),
            notion_database_id: get("NOTION_DATABASE_ID"),
            port: get("PORT"),
        })
    }

    pub fn store(&self) -> Result<StoreSettings> {
        Ok(StoreSettings {
            token: require(&self.notion_token, "NOTION_TOKEN")?,
            database_id: require(&self.notion_database_id, "NOTION_DATABASE_ID")?,
        })
    }

    pub fn model(&self, backend: ModelBackend) -> Result<ModelSettings> {
        match backend {
            ModelBackend::Gemini => Ok(ModelSettings {
                backend,
                api_key: require(&self.gemini_api_key, "GEMINI_API_KEY")?,
                model: self
                    .gemini_model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: None,
            }),
            ModelBackend::OpenAi => Ok(ModelSettings {
                backend,
                api_key: require(&self.openai_api_key, "OPENAI_API_KEY")?,
                model: self
                    .openai_model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: Some(
                    self.openai_base_url
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                ),
            }),
        }
    }

    /// Only `serve` listens, so only `serve` fails on a malformed `PORT`.
    pub fn port(&self) -> Result<u16> {
        match &self.port {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                Error::Configuration(format!("Environment variable 'PORT' is not a valid port: {}", raw))
            }),
            None => Ok(DEFAULT_PORT),
        }
    }
}

fn require(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| Error::Configuration(format!("Environment variable '{}' is required.", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_store_requires_token_and_database() {
        let s = settings(&[("NOTION_TOKEN", "secret")]).unwrap();
        let err = s.store().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("NOTION_DATABASE_ID"));

        let s = settings(&[("NOTION_TOKEN", "secret"), ("NOTION_DATABASE_ID", "db")]).unwrap();
        let store = s.store().unwrap();
        assert_eq!(store.database_id, "db");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let s = settings(&[("GEMINI_API_KEY", "   ")]).unwrap();
        assert!(matches!(s.model(ModelBackend::Gemini), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_model_defaults_and_override() {
        let s = settings(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(s.model(ModelBackend::Gemini).unwrap().model, DEFAULT_GEMINI_MODEL);

        let s = settings(&[("GEMINI_API_KEY", "k"), ("GEMINI_MODEL", "gemini-2.0-flash")]).unwrap();
        assert_eq!(s.model(ModelBackend::Gemini).unwrap().model, "gemini-2.0-flash");

        let s = settings(&[("OPENAI_API_KEY", "k")]).unwrap();
        let model = s.model(ModelBackend::OpenAi).unwrap();
        assert_eq!(model.base_url.as_deref(), Some(DEFAULT_OPENAI_BASE_URL));
        assert_eq!(model.model, DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_port() {
        assert_eq!(settings(&[]).unwrap().port().unwrap(), DEFAULT_PORT);
        assert_eq!(settings(&[("PORT", "8080")]).unwrap().port().unwrap(), 8080);
    }

    #[test]
    fn test_bad_port_only_fails_when_read() {
        let s = settings(&[("PORT", "http"), ("NOTION_TOKEN", "t"), ("NOTION_DATABASE_ID", "db")]).unwrap();
        assert!(s.store().is_ok());
        assert!(s.port().unwrap_err().is_fatal());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let s = settings(&[("NOTION_TOKEN", "very-secret")]).unwrap();
        assert!(!format!("{:?}", s).contains("very-secret"));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Gemini".parse::<ModelBackend>().unwrap(), ModelBackend::Gemini);
        assert_eq!("openai".parse::<ModelBackend>().unwrap(), ModelBackend::OpenAi);
        assert!("claude".parse::<ModelBackend>().is_err());
    }
}
