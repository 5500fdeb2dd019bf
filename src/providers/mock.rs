/*!
 * Mock provider implementation for testing.
 *
 * The mock answers with canned model output so the summarizer can be driven
 * through every decode path without a network:
 * - `MockProvider::working()` - strict JSON summary
 * - `MockProvider::wrapped()` - JSON buried in prose and a code fence
 * - `MockProvider::failing()` - always errors
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};

/// Canned summary used by the mock provider
pub const SAMPLE_SUMMARY_JSON: &str = r#"{
  "title": "Rust in Practice",
  "core_point": "Ownership makes systems code safer.",
  "key_points": ["Borrowing rules", "Fearless concurrency", "Zero-cost abstractions"],
  "detailed_summary": "The video walks through ownership, borrowing and lifetimes.",
  "conclusion": "Rust is worth learning."
}"#;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Returns a strict JSON summary
    Working,
    /// Returns the summary surrounded by prose and a code fence
    Wrapped,
    /// Returns JSON missing the `conclusion` field
    MissingField,
    /// Returns prose without any JSON object
    Garbage,
    /// Returns an empty string
    Empty,
    /// Always fails with an API error
    Failing,
}

/// Mock provider for testing summarizer behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of requests received
    request_count: Arc<AtomicUsize>,
    /// Last request received
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that wraps its JSON in prose
    pub fn wrapped() -> Self {
        Self::new(MockBehavior::Wrapped)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Last request received, if any
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }

    fn canned_text(&self) -> String {
        match self.behavior {
            MockBehavior::Working => SAMPLE_SUMMARY_JSON.to_string(),
            MockBehavior::Wrapped => format!(
                "Sure! Here is the summary you asked for:\n```json\n{}\n```\nLet me know if you need more.",
                SAMPLE_SUMMARY_JSON
            ),
            MockBehavior::MissingField => {
                r#"{"title": "t", "core_point": "c", "key_points": [], "detailed_summary": "d"}"#.to_string()
            }
            MockBehavior::Garbage => "I could not summarize this video, sorry.".to_string(),
            MockBehavior::Empty | MockBehavior::Failing => String::new(),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            last_request: Arc::clone(&self.last_request),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let prompt_len = request.prompt.len() as u64;
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request);
        }

        if self.behavior == MockBehavior::Failing {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            });
        }

        let text = self.canned_text();
        Ok(CompletionResponse {
            completion_tokens: Some(text.len() as u64 / 4),
            prompt_tokens: Some(prompt_len / 4),
            text,
        })
    }

    async fn test_connection(&self, _model: &str) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
