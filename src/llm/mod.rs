pub mod extract;
pub mod prompt;
pub mod providers;

use crate::config::LlmConfig;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM connection error: {0}")]
    ConnectionError(String),
    #[error("LLM response error: {0}")]
    ResponseError(String),
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
}

/// An opaque text oracle: prompt in, free-form answer out.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Routes prompts to the configured backend, picking the model per task.
pub struct LlmManager {
    provider: Box<dyn TextCompletion>,
    sql_model: String,
    insight_model: String,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let provider: Box<dyn TextCompletion> = match config.backend.as_str() {
            "remote" => Box::new(providers::remote::RemoteLlmProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Self::with_provider(
            provider,
            config.model.clone(),
            config.insight_model().to_string(),
        ))
    }

    pub fn with_provider(
        provider: Box<dyn TextCompletion>,
        sql_model: String,
        insight_model: String,
    ) -> Self {
        Self {
            provider,
            sql_model,
            insight_model,
        }
    }

    /// Asks the SQL model for a translation; returns its raw answer.
    pub async fn complete_sql(&self, prompt: &str) -> Result<String, LlmError> {
        info!("Requesting SQL from model {}", self.sql_model);
        self.provider.complete(&self.sql_model, prompt).await
    }

    /// Asks the insight model for chart suggestions; returns its raw answer.
    pub async fn complete_insights(&self, prompt: &str) -> Result<String, LlmError> {
        info!("Requesting insights from model {}", self.insight_model);
        self.provider.complete(&self.insight_model, prompt).await
    }
}
