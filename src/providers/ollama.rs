/*!
 * Ollama client.
 *
 * Uses the non-streaming `/api/generate` endpoint of a local Ollama server.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Translator, http_client, non_empty, request_error, status_error};
use crate::errors::ProviderError;

/// Ollama client for interacting with the Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// HTTP client for API requests
    client: Client,
    /// Server URL, e.g. `http://localhost:11434`
    base_url: String,
    /// Model to run
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Generation request for Ollama
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// The model name
    model: String,

    /// The prompt to generate a response for
    prompt: String,

    /// Always false; the reply is read in one piece
    stream: bool,

    /// Additional model parameters
    options: GenerationOptions,
}

/// Model parameters for a generation request
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    temperature: f32,
}

/// Generation response from Ollama
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// The model name
    #[serde(default)]
    pub model: String,

    /// The generated response
    #[serde(default)]
    pub response: String,

    /// Whether the generation is done
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            options: GenerationOptions { temperature },
        }
    }
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, temperature: f32, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
        }
    }

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| request_error("Ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Ollama: {}", e)))
    }
}

#[async_trait]
impl Translator for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn translate(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let request = GenerationRequest::new(&self.model, prompt, self.temperature);
        let response = self.generate(&request).await?;
        debug!(
            "Ollama model {} replied with {} chars (done: {})",
            response.model,
            response.response.len(),
            response.done
        );
        Ok(non_empty(response.response))
    }
}
