/*!
 * Tests for application configuration functionality
 */

use std::str::FromStr;

use bisub::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "zh");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);

    let common = &config.translation.common;
    assert_eq!(common.batch_size, 5);
    assert_eq!(common.inter_batch_delay_ms, 2000);
    assert_eq!(common.retry_count, 3);
    assert_eq!(common.retry_backoff_ms, 3000);

    assert_eq!(config.merge.max_gap_ms, 8000);
    assert_eq!(config.merge.max_group_duration_ms, 15000);
    assert_eq!(config.merge.max_text_length, 150);

    assert_eq!(config.playback.max_subtitles, 5);
    assert_eq!(config.playback.pending_placeholder, "Translating...");
    assert_eq!(config.cache.key_prefix, "bisub_cache_");
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "zh-TW".to_string();
    assert!(config.validate().is_ok());

    config.translation.provider = TranslationProvider::OpenAI;
    assert!(config.validate().is_err(), "OpenAI without an API key must be rejected");
    config.translation.provider_config_mut(TranslationProvider::OpenAI).api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());

    config.translation.common.batch_size = 0;
    assert!(config.validate().is_err());
    config.translation.common.batch_size = 5;

    config.playback.max_subtitles = 0;
    assert!(config.validate().is_err());
}

/// Test that missing sections fall back to their defaults
#[test]
fn test_config_deserialize_withMinimalJson_shouldFillDefaults() {
    let json = r#"{
        "source_language": "en",
        "target_language": "ja",
        "translation": {
            "provider": "anthropic",
            "available_providers": [
                {"type": "anthropic", "api_key": "key"}
            ]
        }
    }"#;

    let config: Config = serde_json::from_str(json).expect("minimal config should parse");

    assert_eq!(config.translation.provider, TranslationProvider::Anthropic);
    assert_eq!(config.translation.get_api_key(), "key");
    assert_eq!(config.translation.get_model(), ProviderConfig::new(TranslationProvider::Anthropic).model);
    assert_eq!(config.translation.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.translation.common.batch_size, 5);
    assert_eq!(config.merge.max_text_length, 150);
    assert!(config.validate().is_ok());
}

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.exists());

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.target_language, created.target_language);
    assert_eq!(reloaded.translation.available_providers.len(), 4);
}

/// Test that a malformed config file is reported
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

/// Test provider parsing and naming
#[test]
fn test_translationProvider_fromStr_shouldAcceptKnownNames() {
    assert_eq!(TranslationProvider::from_str("OpenAI").unwrap(), TranslationProvider::OpenAI);
    assert_eq!(TranslationProvider::from_str("lmstudio").unwrap(), TranslationProvider::LMStudio);
    assert!(TranslationProvider::from_str("gemini").is_err());
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
    assert!(!TranslationProvider::Ollama.requires_api_key());
}

/// Test that the model override inserts a provider entry when missing
#[test]
fn test_providerConfigMut_withMissingEntry_shouldInsertDefaults() {
    let mut config = Config::default();
    config.translation.available_providers.clear();

    config.translation.provider_config_mut(TranslationProvider::Ollama).model = "qwen2.5:7b".to_string();

    assert_eq!(config.translation.available_providers.len(), 1);
    assert_eq!(config.translation.get_model(), "qwen2.5:7b");
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434");
}
