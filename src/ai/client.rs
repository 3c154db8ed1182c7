//! Client for the local inference service.
//!
//! Each call is a single non-streaming `POST` to the generate endpoint. There
//! are no retries and no pooling guarantees: one request per invocation, bounded
//! by the configured timeout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use super::error::InferenceError;
use crate::config::InferenceConfig;

/// Anything that can turn a prompt into completion text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        config: &InferenceConfig,
    ) -> std::result::Result<String, InferenceError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
}

/// HTTP client speaking the `/api/generate` protocol.
#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
}

impl InferenceClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("smart-terminal/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http })
    }

    async fn exchange(
        &self,
        prompt: &str,
        config: &InferenceConfig,
    ) -> std::result::Result<String, InferenceError> {
        let body = GenerateRequest {
            model: &config.model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(&config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        if !status.is_success() {
            // The service reports problems such as an unknown model as {"error": "..."}
            let detail = serde_json::from_str::<ServiceError>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(InferenceError::Protocol(format!("HTTP {}: {}", status, detail.trim())));
        }

        serde_json::from_str::<GenerateResponse>(&text)
            .map(|envelope| envelope.response)
            .map_err(|e| InferenceError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl CompletionBackend for InferenceClient {
    async fn generate(
        &self,
        prompt: &str,
        config: &InferenceConfig,
    ) -> std::result::Result<String, InferenceError> {
        tracing::info!(
            endpoint = %config.endpoint,
            model = %config.model,
            prompt_len = prompt.len(),
            "Sending generate request"
        );

        // Dropping the exchange future on timeout aborts the in-flight request.
        let result = match timeout(config.timeout, self.exchange(prompt, config)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout(config.timeout)),
        };

        match &result {
            Ok(text) => tracing::debug!(completion_len = text.len(), "Received completion"),
            Err(e) => tracing::warn!("Generate request failed: {}", e),
        }
        result
    }
}
