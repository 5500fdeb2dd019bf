/*!
 * Provider implementations for different LLM services.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: OpenAI API or any OpenAI-compatible server
 * - Anthropic: Anthropic API integration
 * - Ollama: Local LLM server
 * - Mock: canned responses for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Provider-neutral completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier understood by the provider
    pub model: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a request with default sampling settings
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Provider-neutral completion result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Prompt tokens, when reported
    pub prompt_tokens: Option<u64>,
    /// Completion tokens, when reported
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the summarizer.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<CompletionResponse, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider with the given model
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError>;

    /// Human readable provider name
    fn name(&self) -> &str;
}

/// Map a non-success HTTP status to the matching provider error
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Map a transport failure to the matching provider error
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    if err.is_connect() || err.is_timeout() {
        ProviderError::ConnectionError(format!("{}: {}", provider, err))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", provider, err))
    }
}

pub mod openai;
pub mod anthropic;
pub mod ollama;
pub mod mock;
