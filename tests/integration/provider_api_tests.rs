/*!
 * Integration tests for translator backends against mocked HTTP APIs
 */

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bisub::app_config::{Config, TranslationProvider};
use bisub::errors::ProviderError;
use bisub::providers::{Anthropic, Ollama, OpenAI, Translator, build_translator};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Test a successful Ollama generation
#[tokio::test]
async fn test_ollama_translate_withReply_shouldReturnText() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "llama3.2:3b", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:3b",
            "response": "[{\"translation\": \"你好\"}]",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ollama = Ollama::new(server.uri(), "llama3.2:3b", 0.3, TIMEOUT);
    let reply = ollama.translate("prompt").await.unwrap();

    assert_eq!(reply.as_deref(), Some("[{\"translation\": \"你好\"}]"));
}

/// Test that an empty generation counts as no response
#[tokio::test]
async fn test_ollama_translate_withEmptyReply_shouldReturnNone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "  ", "done": true})))
        .mount(&server)
        .await;

    let ollama = Ollama::new(server.uri(), "m", 0.3, TIMEOUT);

    assert_eq!(ollama.translate("prompt").await.unwrap(), None);
}

/// Test that a server error keeps its status code
#[tokio::test]
async fn test_ollama_translate_withServerError_shouldReturnApiError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let ollama = Ollama::new(server.uri(), "m", 0.3, TIMEOUT);
    let error = ollama.translate("prompt").await.unwrap_err();

    match error {
        ProviderError::ApiError { status_code, message } => {
            assert_eq!(status_code, 500);
            assert_eq!(message, "model not loaded");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

/// Test that a closed port is reported as a connection error
#[tokio::test]
async fn test_ollama_translate_withNoServer_shouldReturnConnectionError() {
    // Nothing listens on the discard port
    let ollama = Ollama::new("http://127.0.0.1:9", "m", 0.3, TIMEOUT);

    assert!(matches!(
        ollama.translate("prompt").await,
        Err(ProviderError::ConnectionError(_))
    ));
}

/// Test an OpenAI chat completion with bearer authentication
#[tokio::test]
async fn test_openai_translate_withApiKey_shouldSendBearerToken() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "bonjour"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let openai = OpenAI::new(
        "openai",
        "sk-test",
        format!("{}/v1", server.uri()),
        "gpt-4o-mini",
        0.3,
        TIMEOUT,
    );

    assert_eq!(openai.translate("prompt").await.unwrap().as_deref(), Some("bonjour"));
}

/// Test that a completion without choices counts as no response
#[tokio::test]
async fn test_openai_translate_withNoChoices_shouldReturnNone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let lmstudio = OpenAI::new("lmstudio", "", format!("{}/v1", server.uri()), "local-model", 0.3, TIMEOUT);

    assert_eq!(lmstudio.translate("prompt").await.unwrap(), None);
}

/// Test HTTP status classification for rate limits and bad keys
#[tokio::test]
async fn test_openai_translate_withErrorStatuses_shouldClassify() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/limited/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/denied/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let limited = OpenAI::new("openai", "k", format!("{}/limited", server.uri()), "m", 0.3, TIMEOUT);
    let denied = OpenAI::new("openai", "k", format!("{}/denied", server.uri()), "m", 0.3, TIMEOUT);

    assert!(matches!(
        limited.translate("prompt").await,
        Err(ProviderError::RateLimitExceeded(_))
    ));
    assert!(matches!(
        denied.translate("prompt").await,
        Err(ProviderError::AuthenticationError(_))
    ));
}

/// Test an Anthropic messages call with the required headers
#[tokio::test]
async fn test_anthropic_translate_withReply_shouldJoinTextBlocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"model": "claude-3-haiku-20240307", "max_tokens": 1024})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "hola "},
                {"type": "text", "text": "mundo"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let anthropic = Anthropic::new("ak-test", server.uri(), "claude-3-haiku-20240307", 1024, 0.3, TIMEOUT);

    assert_eq!(anthropic.translate("prompt").await.unwrap().as_deref(), Some("hola mundo"));
}

/// Test that a malformed body is a parse error
#[tokio::test]
async fn test_anthropic_translate_withMalformedBody_shouldReturnParseError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let anthropic = Anthropic::new("k", server.uri(), "m", 10, 0.3, TIMEOUT);

    assert!(matches!(
        anthropic.translate("prompt").await,
        Err(ProviderError::ParseError(_))
    ));
}

/// Test that the configured provider selects the backend
#[test]
fn test_buildTranslator_withEachProvider_shouldNameBackend() {
    let mut config = Config::default();

    for (provider, name) in [
        (TranslationProvider::Ollama, "ollama"),
        (TranslationProvider::OpenAI, "openai"),
        (TranslationProvider::Anthropic, "anthropic"),
        (TranslationProvider::LMStudio, "lmstudio"),
    ] {
        config.translation.provider = provider;
        assert_eq!(build_translator(&config.translation).name(), name);
    }
}
