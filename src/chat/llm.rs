use crate::config::ChatConfig;
use crate::error::{AppError, Result};
use crate::metrics::LLM_REQUEST_DURATION_SECONDS;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Anything that can turn a message list into a reply
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &ChatConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Integration {
                integration_source: "llm".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            AppError::Integration {
                integration_source: "llm".to_string(),
                message: format!("Invalid completion response: {}", e),
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| AppError::Integration {
                integration_source: "llm".to_string(),
                message: "Completion response had no choices".to_string(),
            })
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let start = Instant::now();
        let result = self.send(messages).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        LLM_REQUEST_DURATION_SECONDS
            .with_label_values(&[status])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}
