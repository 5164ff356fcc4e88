//! Ollama provider implementation.
//!
//! Talks to Ollama's native API:
//! - `POST /api/generate` — single-prompt completion (non-streaming)
//! - `GET  /api/tags`     — locally available models, doubles as health check
//!
//! Loading a model uses Ollama's convention that a generate request with an
//! empty prompt only loads the model into memory.

use std::time::Duration;

use async_trait::async_trait;
use docchat_core::error::ProviderError;
use docchat_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// A locally hosted Ollama server.
pub struct OllamaProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider for the Ollama server at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "ollama".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Ollama on its default local port with a five minute timeout.
    pub fn local() -> Result<Self, ProviderError> {
        Self::new(DEFAULT_BASE_URL, Duration::from_secs(300))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate(&self, body: &GenerateRequest<'_>) -> Result<GenerateResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();

        if status == 404 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(model = %body.model, body = %error_body, "Ollama does not have the model");
            return Err(ProviderError::ModelNotFound(body.model.to_string()));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: api_error_message(&error_body),
            });
        }

        response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: status,
            message: format!("Failed to parse response: {e}"),
        })
    }

    async fn tags(&self) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        self.client.get(&url).send().await.map_err(transport_error)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        debug!(
            provider = %self.name,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending generate request"
        );

        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: request.temperature.map(|temperature| GenerateOptions { temperature }),
        };
        let api_response = self.generate(&body).await?;

        let usage = match (api_response.prompt_eval_count, api_response.eval_count) {
            (Some(prompt_tokens), Some(completion_tokens)) => Some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
            _ => None,
        };

        Ok(ProviderResponse {
            text: api_response.response,
            model: api_response.model.unwrap_or(request.model),
            usage,
        })
    }

    async fn load_model(&self, model: &str) -> Result<(), ProviderError> {
        info!(provider = %self.name, model, "Loading model");
        let body = GenerateRequest {
            model,
            prompt: "",
            stream: false,
            options: None,
        };
        self.generate(&body).await?;
        Ok(())
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self.tags().await?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let response = self.tags().await?;
        Ok(response.status().is_success())
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Ollama reports failures as `{"error": "..."}`; fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string())
}

// --- Ollama API types ---

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}
