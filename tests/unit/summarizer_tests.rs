/*!
 * Tests for summary prompting and decoding
 */

use anyhow::Result;
use subdigest::errors::{ProviderError, SummaryError};
use subdigest::providers::mock::MockBehavior;
use subdigest::summarizer::{build_prompt, decode_summary, lenient_decode, VideoSummary};
use subdigest::video::VideoReference;
use crate::common;

fn video() -> VideoReference {
    VideoReference::parse("https://www.bilibili.com/video/BV1xx411c7mD")
}

/// Test strict decoding of a clean JSON answer
#[test]
fn test_decodeSummary_withCleanJson_shouldDecode() -> Result<()> {
    let summary = decode_summary(
        r#"{"title": "T", "core_point": "C", "key_points": ["a", "b"], "detailed_summary": "D", "conclusion": "E"}"#,
    )?;

    assert_eq!(
        summary,
        VideoSummary {
            title: "T".to_string(),
            core_point: "C".to_string(),
            key_points: vec!["a".to_string(), "b".to_string()],
            detailed_summary: "D".to_string(),
            conclusion: "E".to_string(),
        }
    );
    Ok(())
}

/// Test that the original Chinese field names are accepted
#[test]
fn test_decodeSummary_withChineseKeys_shouldDecode() -> Result<()> {
    let summary = decode_summary(
        r#"{"标题": "人工智能", "核心内容": "核心", "关键点": ["一", "二"], "详细摘要": "详细", "结论": "结论"}"#,
    )?;

    assert_eq!(summary.title, "人工智能");
    assert_eq!(summary.key_points, vec!["一", "二"]);
    Ok(())
}

/// Test lenient recovery of JSON wrapped in prose and a code fence
#[test]
fn test_decodeSummary_withProseAndFence_shouldRecoverObject() -> Result<()> {
    let response = "Sure, here you go:\n```json\n{\"title\": \"T {1}\", \"core_point\": \"C\", \"key_points\": [], \"detailed_summary\": \"D\", \"conclusion\": \"E\"}\n```\nAnything else?";
    let summary = decode_summary(response)?;

    assert_eq!(summary.title, "T {1}");
    Ok(())
}

/// Test lenient recovery without a fence
#[test]
fn test_lenientDecode_withTrailingProse_shouldTakeFirstBalancedObject() -> Result<()> {
    let response = r#"Result: {"title": "T", "core_point": "C", "key_points": ["x"], "detailed_summary": "D", "conclusion": "E"} and then {"other": 1}"#;
    let summary = lenient_decode(response)?;

    assert_eq!(summary.conclusion, "E");
    Ok(())
}

/// Test that text with no recoverable object is a lenient decode error
#[test]
fn test_decodeSummary_withProseOnly_shouldReturnLenientError() {
    let result = decode_summary("I cannot help with that.");
    assert!(matches!(result, Err(SummaryError::LenientDecode(_))));

    let result = decode_summary("{\"title\": \"unterminated");
    assert!(matches!(result, Err(SummaryError::LenientDecode(_))));
}

/// Test that valid JSON without a required field is reported by name
#[test]
fn test_decodeSummary_withMissingConclusion_shouldReturnMissingField() {
    let result = decode_summary(r#"{"title": "T", "core_point": "C", "key_points": [], "detailed_summary": "D"}"#);

    match result {
        Err(SummaryError::MissingField(field)) => assert_eq!(field, "conclusion"),
        other => panic!("expected missing field, got {:?}", other),
    }
}

/// Test that wrongly typed fields are a strict decode error
#[test]
fn test_decodeSummary_withWrongFieldType_shouldReturnStrictError() {
    let result = decode_summary(
        r#"{"title": "T", "core_point": "C", "key_points": "not a list", "detailed_summary": "D", "conclusion": "E"}"#,
    );
    assert!(matches!(result, Err(SummaryError::StrictDecode(_))));

    assert!(matches!(decode_summary("[1, 2]"), Err(SummaryError::StrictDecode(_))));
}

/// Test that blank responses are reported as empty
#[test]
fn test_decodeSummary_withBlankResponse_shouldReturnEmptyResponse() {
    assert!(matches!(decode_summary("  \n "), Err(SummaryError::EmptyResponse)));
}

/// Test that the prompt carries the URL and is truncated by characters
#[test]
fn test_buildPrompt_withLongText_shouldTruncateByCharacters() {
    let text = "字".repeat(20);
    let prompt = build_prompt(&text, &video(), 5);

    assert!(prompt.contains("https://www.bilibili.com/video/BV1xx411c7mD"));
    assert!(prompt.contains(&"字".repeat(5)));
    assert!(!prompt.contains(&"字".repeat(6)));
    assert!(prompt.contains("\"key_points\""));
}

/// Test a full summarize call through the mock provider
#[tokio::test]
async fn test_summarize_withWorkingProvider_shouldSendSettingsAndDecode() -> Result<()> {
    let (summarizer, provider) = common::mock_summarizer(MockBehavior::Working);
    let summarizer = summarizer
        .system_prompt("Be concise")
        .temperature(0.2)
        .max_tokens(512)
        .max_input_chars(10);

    let summary = summarizer.summarize(&"x".repeat(50), &video()).await?;

    assert_eq!(summary.title, "Rust in Practice");
    assert_eq!(summary.key_points.len(), 3);

    let request = provider.last_request().expect("request recorded");
    assert_eq!(request.model, "mock-model");
    assert_eq!(request.system.as_deref(), Some("Be concise"));
    assert_eq!(request.temperature, 0.2);
    assert_eq!(request.max_tokens, 512);
    assert!(request.prompt.contains(&"x".repeat(10)));
    assert!(!request.prompt.contains(&"x".repeat(11)));
    assert_eq!(provider.request_count(), 1);
    Ok(())
}

/// Test that wrapped answers go through the lenient path
#[tokio::test]
async fn test_summarize_withWrappedAnswer_shouldRecover() -> Result<()> {
    let (summarizer, _) = common::mock_summarizer(MockBehavior::Wrapped);
    let summary = summarizer.summarize("text", &video()).await?;

    assert_eq!(summary.conclusion, "Rust is worth learning.");
    Ok(())
}

/// Test that each failure mode keeps its own error kind
#[tokio::test]
async fn test_summarize_withFailureModes_shouldMapErrors() {
    let (summarizer, _) = common::mock_summarizer(MockBehavior::Failing);
    assert!(matches!(
        summarizer.summarize("text", &video()).await,
        Err(SummaryError::Provider(ProviderError::ApiError { status_code: 500, .. }))
    ));

    let (summarizer, _) = common::mock_summarizer(MockBehavior::Empty);
    assert!(matches!(summarizer.summarize("text", &video()).await, Err(SummaryError::EmptyResponse)));

    let (summarizer, _) = common::mock_summarizer(MockBehavior::Garbage);
    assert!(matches!(summarizer.summarize("text", &video()).await, Err(SummaryError::LenientDecode(_))));

    let (summarizer, _) = common::mock_summarizer(MockBehavior::MissingField);
    assert!(matches!(summarizer.summarize("text", &video()).await, Err(SummaryError::MissingField(_))));
}

/// Test that an empty system prompt is not sent
#[tokio::test]
async fn test_summarize_withBlankSystemPrompt_shouldOmitIt() -> Result<()> {
    let (summarizer, provider) = common::mock_summarizer(MockBehavior::Working);
    summarizer.system_prompt("   ").summarize("text", &video()).await?;

    assert_eq!(provider.last_request().expect("request recorded").system, None);
    Ok(())
}
