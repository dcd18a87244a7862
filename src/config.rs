use std::env;

use crate::errors::{AppError, AppResult};
use crate::services::scheduling::ValidationMode;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub llm_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub temperature: f32,
    pub llm_timeout_secs: u64,
    pub validation_mode: ValidationMode,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "clinic.db".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            temperature: env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.2),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            validation_mode: env::var("VALIDATION_MODE")
                .map(|v| ValidationMode::parse(&v))
                .unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        match self.llm_provider.as_str() {
            "openai" if self.openai_api_key.is_empty() => {
                return Err(AppError::Config(
                    "OPENAI_API_KEY must be set when LLM_PROVIDER=openai".to_string(),
                ));
            }
            "openai" | "ollama" => {}
            other => {
                return Err(AppError::Config(format!("unknown LLM_PROVIDER: {other}")));
            }
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "LLM_TEMPERATURE must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.llm_timeout_secs == 0 {
            return Err(AppError::Config("LLM_TIMEOUT_SECS must be positive".to_string()));
        }

        Ok(())
    }
}
