/*!
 * Tests for application configuration
 */

use anyhow::Result;
use std::str::FromStr;
use subdigest::app_config::{Config, LogLevel, SummaryProvider};
use crate::common;

fn no_env(_: &str) -> Option<String> {
    None
}

/// Test the default configuration values
#[test]
fn test_default_config_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.subtitle.max_gap_seconds, 2.0);
    assert_eq!(config.download.tool, "yutto");
    assert_eq!(config.download.timeout_secs, 300);
    assert!(config.download.output_dir.is_none());
    assert_eq!(config.summary.provider, SummaryProvider::OpenAI);
    assert_eq!(config.summary.common.temperature, 0.7);
    assert_eq!(config.summary.common.max_input_chars, 15_000);
    assert_eq!(config.summary.get_model(), "gpt-3.5-turbo");
    assert_eq!(config.summary.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.subtitle.max_gap_seconds, 2.0);
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(written["summary"]["provider"], "openai");
    assert_eq!(written["summary"]["available_providers"][0]["type"], "openai");
    Ok(())
}

/// Test that a partial file is filled in with defaults
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"subtitle": {"max_gap_seconds": 0.5}, "summary": {"provider": "ollama"}, "log_level": "debug"}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.subtitle.max_gap_seconds, 0.5);
    assert_eq!(config.summary.provider, SummaryProvider::Ollama);
    assert_eq!(config.summary.get_model(), "llama3");
    assert_eq!(config.summary.get_endpoint(), "http://localhost:11434");
    assert_eq!(config.download.tool, "yutto");
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that malformed JSON is reported
#[test]
fn test_loadOrCreate_withMalformedJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

/// Test validation of numeric settings
#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.subtitle.max_gap_seconds = -1.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.summary.common.max_input_chars = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.summary.common.temperature = 3.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.download.tool = "  ".to_string();
    assert!(config.validate().is_err());
}

/// Test API key resolution order: explicit value, then environment
#[test]
fn test_getApiKey_shouldPreferConfiguredKeyOverEnvironment() {
    let env = |name: &str| (name == "OPENAI_API_KEY").then(|| "env-key".to_string());

    let mut config = Config::default();
    assert_eq!(config.summary.get_api_key(env), "env-key");

    config.summary.active_provider_config_mut().api_key = " file-key ".to_string();
    assert_eq!(config.summary.get_api_key(env), "file-key");
}

/// Test that a keyed provider without any key cannot be resolved
#[test]
fn test_resolve_withoutApiKey_shouldFailForOpenAi() {
    let config = Config::default();
    let err = config.summary.resolve(no_env).unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

/// Test that Ollama resolves without a key
#[test]
fn test_resolve_withOllama_shouldNotNeedApiKey() -> Result<()> {
    let mut config = Config::default();
    config.summary.provider = SummaryProvider::Ollama;

    let settings = config.summary.resolve(no_env)?;
    assert_eq!(settings.provider, SummaryProvider::Ollama);
    assert_eq!(settings.api_key, "");
    assert_eq!(settings.model, "llama3");
    Ok(())
}

/// Test that overrides land on the active provider, created when missing
#[test]
fn test_activeProviderConfigMut_withMissingEntry_shouldCreateIt() -> Result<()> {
    let mut config = Config::default();
    config.summary.available_providers.clear();
    config.summary.provider = SummaryProvider::Anthropic;

    {
        let provider = config.summary.active_provider_config_mut();
        provider.model = "claude-custom".to_string();
        provider.api_key = "k".to_string();
        provider.endpoint = "https://proxy.example.com".to_string();
    }

    let settings = config.summary.resolve(no_env)?;
    assert_eq!(settings.model, "claude-custom");
    assert_eq!(settings.endpoint, "https://proxy.example.com");
    assert_eq!(config.summary.available_providers.len(), 1);
    Ok(())
}

/// Test that empty model and endpoint fall back to provider defaults
#[test]
fn test_resolve_withEmptyModel_shouldUseDefault() -> Result<()> {
    let mut config = Config::default();
    {
        let provider = config.summary.active_provider_config_mut();
        provider.model.clear();
        provider.endpoint.clear();
        provider.api_key = "k".to_string();
    }

    let settings = config.summary.resolve(no_env)?;
    assert_eq!(settings.model, "gpt-3.5-turbo");
    assert_eq!(settings.endpoint, "https://api.openai.com/v1");
    assert_eq!(settings.temperature, 0.7);
    Ok(())
}

/// Test provider name parsing
#[test]
fn test_summaryProvider_fromStr_shouldBeCaseInsensitive() -> Result<()> {
    assert_eq!(SummaryProvider::from_str("OpenAI")?, SummaryProvider::OpenAI);
    assert_eq!(SummaryProvider::from_str("anthropic")?, SummaryProvider::Anthropic);
    assert_eq!(SummaryProvider::from_str("OLLAMA")?, SummaryProvider::Ollama);
    assert!(SummaryProvider::from_str("gemini").is_err());
    assert_eq!(SummaryProvider::Anthropic.to_string(), "anthropic");
    Ok(())
}
