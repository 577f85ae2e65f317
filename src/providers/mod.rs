/*!
 * Translator backends.
 *
 * This module contains client implementations for the supported completion
 * services, all behind the [`Translator`] trait:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration, also used for LM Studio
 * - Anthropic: Anthropic API integration
 * - Mock: Scripted replies for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// Common trait for all translator backends
///
/// A translator turns one prompt into one free-form reply. It knows nothing
/// about batches or subtitles.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Complete a prompt
    ///
    /// # Returns
    /// * `Ok(Some(text))` - The reply text
    /// * `Ok(None)` - The backend answered without any text; not retried
    /// * `Err(ProviderError)` - A transient failure; the batch may be retried
    async fn translate(&self, prompt: &str) -> Result<Option<String>, ProviderError>;

    /// Release backend resources at the end of a pipeline run
    async fn cleanup(&self) {}
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use anthropic::Anthropic;
pub use mock::{MockBehavior, MockReply, MockTranslator};
pub use ollama::Ollama;
pub use openai::OpenAI;

/// Create the translator selected by the configuration
pub fn build_translator(config: &TranslationConfig) -> Box<dyn Translator> {
    let model = config.get_model();
    let endpoint = config.get_endpoint();
    let api_key = config.get_api_key();
    let timeout = Duration::from_secs(config.get_timeout_secs());
    let temperature = config.common.temperature;

    match config.provider {
        TranslationProvider::Ollama => Box::new(Ollama::new(endpoint, model, temperature, timeout)),
        TranslationProvider::OpenAI => Box::new(OpenAI::new(
            "openai",
            api_key,
            endpoint,
            model,
            temperature,
            timeout,
        )),
        TranslationProvider::LMStudio => Box::new(OpenAI::new(
            "lmstudio",
            api_key,
            endpoint,
            model,
            temperature,
            timeout,
        )),
        TranslationProvider::Anthropic => Box::new(Anthropic::new(
            api_key,
            endpoint,
            model,
            config.get_max_tokens(),
            temperature,
            timeout,
        )),
    }
}

/// HTTP client with the request timeout applied
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_default()
}

/// Map a transport failure to a provider error
pub(crate) fn request_error(backend: &str, error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(format!("{}: {}", backend, error))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", backend, error))
    }
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    }
}

/// Treat an empty or whitespace-only reply as absent
pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
