use crate::config::LlmConfig;
use crate::llm::{LlmError, TextCompletion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";

pub struct OllamaProvider {
    client: reqwest::Client,
    api_url: String,
    temperature: Option<f32>,
}

#[derive(Serialize, Debug)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize, Debug)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        // No timeout unless configured: a slow model only stalls its own request
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl TextCompletion for OllamaProvider {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        info!("Sending request to Ollama with model: {}", model);
        debug!("API URL: {}", self.api_url);

        let request = OllamaRequest {
            model,
            prompt,
            stream: false,
            options: self.temperature.map(|temperature| OllamaOptions { temperature }),
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Try to get the error message from the response body
            let error_body = match response.text().await {
                Ok(body) => format!(" - Response body: {}", body),
                Err(_) => String::new(),
            };

            error!("Ollama API responded with status code: {}{}", status, error_body);
            return Err(LlmError::ResponseError(format!(
                "Ollama API responded with status code: {}{}",
                status, error_body
            )));
        }

        // Get the raw text response first for diagnostics
        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseError(format!("Failed to read response body: {}", e)))?;

        let ollama_response = serde_json::from_str::<OllamaResponse>(&response_text).map_err(|e| {
            error!("Failed to parse Ollama response: {} - Response was: {}", e, response_text);
            LlmError::ResponseError(format!(
                "Failed to parse Ollama response: {} - Response was: {}",
                e, response_text
            ))
        })?;

        debug!("Raw answer from Ollama: {}", ollama_response.response);
        Ok(ollama_response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_matches_generate_api_shape() {
        let request = OllamaRequest {
            model: "phi:2.7b",
            prompt: "hello",
            stream: false,
            options: None,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"model": "phi:2.7b", "prompt": "hello", "stream": false})
        );
    }

    #[test]
    fn response_ignores_extra_fields() {
        let parsed: OllamaResponse = serde_json::from_str(
            r#"{"model":"phi:2.7b","created_at":"2024-01-01T00:00:00Z","response":"SELECT 1;","done":true}"#,
        )
        .unwrap();
        assert_eq!(parsed.response, "SELECT 1;");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_connection_error() {
        let mut config = crate::config::AppConfig::default().llm;
        config.api_url = Some("http://127.0.0.1:9/api/generate".into());
        let provider = OllamaProvider::new(&config).unwrap();

        let err = provider.complete("phi:2.7b", "hi").await.unwrap_err();
        assert!(matches!(err, LlmError::ConnectionError(_)));
    }
}
