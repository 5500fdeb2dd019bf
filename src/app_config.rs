use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::merge::DEFAULT_MAX_GAP_SECONDS;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Subtitle processing settings
    #[serde(default)]
    pub subtitle: SubtitleConfig,

    /// Subtitle download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Summary generation settings
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Summary provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryProvider {
    // @provider: OpenAI or any OpenAI-compatible server
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
}

impl SummaryProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    // @returns: Environment variable holding the API key, if the provider uses one
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }

    fn default_model(&self) -> String {
        match self {
            Self::OpenAI => default_openai_model(),
            Self::Anthropic => default_anthropic_model(),
            Self::Ollama => default_ollama_model(),
        }
    }

    fn default_endpoint(&self) -> String {
        match self {
            Self::OpenAI => default_openai_endpoint(),
            Self::Anthropic => default_anthropic_endpoint(),
            Self::Ollama => default_ollama_endpoint(),
        }
    }
}

impl std::fmt::Display for SummaryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for SummaryProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name, empty means provider default
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key, empty means environment
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL, empty means provider default
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider: SummaryProvider) -> Self {
        Self {
            provider_type: provider.to_lowercase_string(),
            model: provider.default_model(),
            api_key: String::new(),
            endpoint: provider.default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Summary service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SummaryConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: SummaryProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common settings
    #[serde(default)]
    pub common: SummaryCommonConfig,
}

/// Settings shared by every provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SummaryCommonConfig {
    /// System prompt sent with every summary request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Subtitle text is cut to this many characters before prompting
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for SummaryCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_input_chars: default_max_input_chars(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Configuration for subtitle processing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubtitleConfig {
    /// Adjacent lines closer than this many seconds are merged
    #[serde(default = "default_max_gap_seconds")]
    pub max_gap_seconds: f64,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            max_gap_seconds: default_max_gap_seconds(),
        }
    }
}

/// Configuration for subtitle download
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadConfig {
    /// Downloader program
    #[serde(default = "default_download_tool")]
    pub tool: String,

    /// Subprocess timeout in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub timeout_secs: u64,

    /// Where subtitles are kept; a temporary directory when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            tool: default_download_tool(),
            timeout_secs: default_download_timeout_secs(),
            output_dir: None,
        }
    }
}

/// Configuration for the HTML report
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory receiving the report
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Fully resolved settings for the active provider
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Provider to talk to
    pub provider: SummaryProvider,
    /// Model name
    pub model: String,
    /// API key, empty for providers without authentication
    pub api_key: String,
    /// Base URL
    pub endpoint: String,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

fn default_max_gap_seconds() -> f64 {
    DEFAULT_MAX_GAP_SECONDS
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_download_tool() -> String {
    "yutto".to_string()
}

fn default_download_timeout_secs() -> u64 {
    300
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_input_chars() -> usize {
    15_000
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_system_prompt() -> String {
    "You summarize videos from their subtitles. Answer with a single JSON object and nothing else.".to_string()
}

impl Config {
    /// Load the configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            log::warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let gap = self.subtitle.max_gap_seconds;
        if !gap.is_finite() || gap < 0.0 {
            return Err(anyhow!("subtitle.max_gap_seconds must be a non-negative number, got {}", gap));
        }

        if self.summary.common.max_input_chars == 0 {
            return Err(anyhow!("summary.common.max_input_chars must be greater than zero"));
        }

        if !(0.0..=2.0).contains(&self.summary.common.temperature) {
            return Err(anyhow!(
                "summary.common.temperature must be between 0.0 and 2.0, got {}",
                self.summary.common.temperature
            ));
        }

        if self.download.tool.trim().is_empty() {
            return Err(anyhow!("download.tool must name a program"));
        }

        Ok(())
    }

    /// Resolve the active provider settings, reading API keys from the process environment
    pub fn llm_settings(&self) -> Result<LlmSettings> {
        self.summary.resolve(|name| std::env::var(name).ok())
    }
}

impl SummaryConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider: &SummaryProvider) -> Option<&ProviderConfig> {
        let provider_str = provider.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created when missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str);

        let index = match position {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .filter(|p| !p.model.is_empty())
            .map(|p| p.model.clone())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .filter(|p| !p.endpoint.is_empty())
            .map(|p| p.endpoint.clone())
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// Get the API key: configured value, then the provider's environment variable
    pub fn get_api_key<F>(&self, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.trim().is_empty() {
                return provider_config.api_key.trim().to_string();
            }
        }

        self.provider
            .api_key_env_var()
            .and_then(|name| env(name))
            .map(|key| key.trim().to_string())
            .unwrap_or_default()
    }

    /// Resolve every setting for the active provider.
    ///
    /// Fails when the provider needs an API key and none was configured or
    /// found in the environment.
    pub fn resolve<F>(&self, env: F) -> Result<LlmSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = self.get_api_key(env);
        if let Some(var) = self.provider.api_key_env_var() {
            if api_key.is_empty() {
                return Err(anyhow!(
                    "No API key for {}: set it in the config, pass --api-key or export {}",
                    self.provider.display_name(),
                    var
                ));
            }
        }

        let timeout_secs = self
            .get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs);

        Ok(LlmSettings {
            provider: self.provider,
            model: self.get_model(),
            api_key,
            endpoint: self.get_endpoint(),
            timeout_secs,
            temperature: self.common.temperature,
            max_tokens: self.common.max_tokens,
        })
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            provider: SummaryProvider::default(),
            available_providers: vec![
                ProviderConfig::new(SummaryProvider::OpenAI),
                ProviderConfig::new(SummaryProvider::Anthropic),
                ProviderConfig::new(SummaryProvider::Ollama),
            ],
            common: SummaryCommonConfig::default(),
        }
    }
}
