/*!
 * Structured video summaries generated by an LLM.
 *
 * This module contains the `Summarizer`, which turns the full subtitle text
 * into a `VideoSummary` by prompting a provider for a JSON object and
 * decoding its answer:
 * - strict decode of the whole response first
 * - lenient recovery of the first balanced JSON object when that fails
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{LlmSettings, SummaryCommonConfig, SummaryProvider};
use crate::errors::SummaryError;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::providers::{CompletionRequest, Provider};
use crate::video::VideoReference;

/// Characters of detailed summary shown in the console preview
pub const PREVIEW_CHARS: usize = 100;

/// Default cap on subtitle characters sent to the model
pub const DEFAULT_MAX_INPUT_CHARS: usize = 15_000;

// @const: Required fields as (english key, legacy key)
const REQUIRED_FIELDS: [(&str, &str); 5] = [
    ("title", "标题"),
    ("core_point", "核心内容"),
    ("key_points", "关键点"),
    ("detailed_summary", "详细摘要"),
    ("conclusion", "结论"),
];

/// Structured summary of one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    // @field: Short informative title
    #[serde(alias = "标题")]
    pub title: String,

    // @field: One-sentence core point
    #[serde(alias = "核心内容")]
    pub core_point: String,

    // @field: Key points in order
    #[serde(alias = "关键点")]
    pub key_points: Vec<String>,

    // @field: Multi-paragraph summary
    #[serde(alias = "详细摘要")]
    pub detailed_summary: String,

    // @field: Closing conclusion
    #[serde(alias = "结论")]
    pub conclusion: String,
}

impl VideoSummary {
    /// Console preview: every field, with the detailed summary cut short
    pub fn preview(&self) -> String {
        let mut out = String::new();
        out.push_str("===== Summary preview =====\n");
        out.push_str(&format!("Title: {}\n", self.title));
        out.push_str(&format!("Core point: {}\n", self.core_point));
        out.push_str("Key points:\n");
        for (i, point) in self.key_points.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, point));
        }
        let detail = truncate_chars(&self.detailed_summary, PREVIEW_CHARS);
        let ellipsis = if detail.len() < self.detailed_summary.len() { "..." } else { "" };
        out.push_str(&format!("Detailed summary: {}{}\n", detail, ellipsis));
        out.push_str(&format!("Conclusion: {}\n", self.conclusion));
        out.push_str("===========================");
        out
    }
}

/// Cut `text` to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Build the user prompt for a summary request
pub fn build_prompt(subtitle_text: &str, video: &VideoReference, max_input_chars: usize) -> String {
    let text = truncate_chars(subtitle_text, max_input_chars);

    format!(
        r#"Write a comprehensive summary of a video in Simplified Chinese. You are given its subtitle text.

Video URL: {url}

Subtitles:
{text}

Answer with a JSON object of exactly this shape:
{{
  "title": "a short but informative title",
  "core_point": "the core point of the video in one sentence",
  "key_points": ["key point 1", "key point 2", "key point 3"],
  "detailed_summary": "a detailed summary of several paragraphs, at most 800 characters",
  "conclusion": "the conclusion of the video"
}}

The answer must be valid JSON. Do not add any text before or after it and do not wrap it in ```json fences."#,
        url = video.url,
        text = text,
    )
}

/// Decode a model response into a summary.
///
/// The whole response is parsed as JSON first. When that is not valid JSON,
/// the first balanced `{...}` object in the text is tried instead, after
/// unwrapping a Markdown code fence if one is present. Valid JSON that lacks
/// a required field fails with `MissingField` on either path.
pub fn decode_summary(response: &str) -> Result<VideoSummary, SummaryError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(SummaryError::EmptyResponse);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => summary_from_value(value),
        Err(e) => {
            debug!("Strict JSON decode failed ({}), trying lenient recovery", e);
            lenient_decode(trimmed)
        }
    }
}

/// Recover a summary from free text around a JSON object
pub fn lenient_decode(response: &str) -> Result<VideoSummary, SummaryError> {
    let fenced = unwrap_code_fence(response);
    let candidates = fenced.into_iter().chain(std::iter::once(response));

    let mut last_error = "no JSON object found".to_string();
    for candidate in candidates {
        for object in balanced_objects(candidate) {
            match serde_json::from_str::<Value>(object) {
                Ok(value) => return summary_from_value(value),
                Err(e) => last_error = e.to_string(),
            }
        }
    }

    Err(SummaryError::LenientDecode(last_error))
}

fn summary_from_value(value: Value) -> Result<VideoSummary, SummaryError> {
    let Value::Object(map) = value else {
        return Err(SummaryError::StrictDecode("expected a JSON object".to_string()));
    };

    for (english, legacy) in REQUIRED_FIELDS {
        if !has_field(&map, english) && !has_field(&map, legacy) {
            return Err(SummaryError::MissingField(english.to_string()));
        }
    }

    serde_json::from_value(Value::Object(map)).map_err(|e| SummaryError::StrictDecode(e.to_string()))
}

fn has_field(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_some_and(|v| !v.is_null())
}

/// Inner text of the first Markdown code fence, if any
fn unwrap_code_fence(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    // Skip the info string (`json`, `JSON`, ...)
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Every balanced `{...}` span in `text`, in order of their opening brace.
///
/// Braces inside JSON string literals are ignored.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .filter_map(move |(start, _)| matching_brace(&text[start..]).map(|end| &text[start..start + end + 1]))
}

/// Byte offset of the brace closing the object that opens at offset 0
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Build the provider client described by the resolved settings
pub fn create_provider(settings: &LlmSettings) -> Arc<dyn Provider> {
    match settings.provider {
        SummaryProvider::OpenAI => Arc::new(OpenAI::new(
            settings.api_key.clone(),
            settings.endpoint.clone(),
            settings.timeout_secs,
        )),
        SummaryProvider::Anthropic => Arc::new(Anthropic::new(
            settings.api_key.clone(),
            settings.endpoint.clone(),
            settings.timeout_secs,
        )),
        SummaryProvider::Ollama => Arc::new(Ollama::new(settings.endpoint.clone(), settings.timeout_secs)),
    }
}

/// Generates structured summaries through an LLM provider
#[derive(Debug, Clone)]
pub struct Summarizer {
    // @field: Provider client
    provider: Arc<dyn Provider>,

    // @field: Model name
    model: String,

    // @field: Optional system prompt
    system_prompt: Option<String>,

    // @field: Sampling temperature
    temperature: f32,

    // @field: Generated token cap
    max_tokens: u32,

    // @field: Subtitle character cap
    max_input_chars: usize,
}

impl Summarizer {
    /// Create a summarizer with default sampling settings
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 4096,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Create a summarizer from resolved provider settings and the shared summary settings
    pub fn from_settings(settings: &LlmSettings, common: &SummaryCommonConfig) -> Self {
        Self::new(create_provider(settings), settings.model.clone())
            .system_prompt(common.system_prompt.clone())
            .temperature(settings.temperature)
            .max_tokens(settings.max_tokens)
            .max_input_chars(common.max_input_chars)
    }

    /// Set the system prompt, an empty prompt clears it
    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        self.system_prompt = if system_prompt.trim().is_empty() { None } else { Some(system_prompt) };
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

    /// Set how many subtitle characters are sent to the model
    pub fn max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Model used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a minimal request to verify the provider and model are reachable
    pub async fn test_connection(&self) -> Result<(), SummaryError> {
        debug!("Testing connection to {} with model {}", self.provider.name(), self.model);
        self.provider.test_connection(&self.model).await?;
        Ok(())
    }

    /// Summarize the full subtitle text of `video`
    pub async fn summarize(&self, subtitle_text: &str, video: &VideoReference) -> Result<VideoSummary, SummaryError> {
        let char_count = subtitle_text.chars().count();
        if char_count > self.max_input_chars {
            warn!(
                "Subtitle text has {} characters, only the first {} are sent to the model",
                char_count, self.max_input_chars
            );
        }

        let mut request = CompletionRequest::new(self.model.clone(), build_prompt(subtitle_text, video, self.max_input_chars))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);
        if let Some(system) = &self.system_prompt {
            request = request.system(system.clone());
        }

        info!("Requesting summary from {} ({})", self.provider.name(), self.model);
        let started = Instant::now();
        let response = self.provider.complete(request).await?;
        debug!(
            "Summary response in {:.2}s, tokens: prompt {:?}, completion {:?}",
            started.elapsed().as_secs_f64(),
            response.prompt_tokens,
            response.completion_tokens
        );

        decode_summary(&response.text)
    }
}
