/*!
 * Tests for the adjacency merge engine
 */

use anyhow::Result;
use subdigest::errors::SubtitleError;
use subdigest::merge::{merge_entries, MergeEngine, MergedSpan, DEFAULT_MAX_GAP_SECONDS};
use subdigest::subtitle_processor::CaptionEntry;
use subdigest::timecode;

fn entry(index: usize, start: &str, end: &str, text: &str) -> CaptionEntry {
    CaptionEntry::new(index.to_string(), start, end, text)
}

/// Entries of 1s each, separated by the given gaps in milliseconds
fn entries_with_gaps(gaps_ms: &[u64]) -> Vec<CaptionEntry> {
    let mut entries = Vec::new();
    let mut start = 0u64;
    for i in 0..=gaps_ms.len() {
        let end = start + 1_000;
        entries.push(entry(
            i + 1,
            &timecode::format_millis(start),
            &timecode::format_millis(end),
            &format!("t{}", i + 1),
        ));
        if let Some(gap) = gaps_ms.get(i) {
            start = end + gap;
        }
    }
    entries
}

/// Test the A/B/C scenario: a 1.5s gap merges, a 6s gap splits
#[test]
fn test_merge_withAbcScenario_shouldProduceTwoSpans() -> Result<()> {
    let entries = vec![
        entry(1, "00:00:00,000", "00:00:02,000", "A"),
        entry(2, "00:00:03,500", "00:00:04,000", "B"),
        entry(3, "00:00:10,000", "00:00:11,000", "C"),
    ];

    let spans = merge_entries(&entries, 2.0)?;

    assert_eq!(
        spans,
        vec![
            MergedSpan {
                start_time: "00:00:00,000".to_string(),
                end_time: "00:00:04,000".to_string(),
                text: "A B".to_string(),
            },
            MergedSpan {
                start_time: "00:00:10,000".to_string(),
                end_time: "00:00:11,000".to_string(),
                text: "C".to_string(),
            },
        ]
    );
    Ok(())
}

/// Test that a gap of exactly the threshold merges
#[test]
fn test_merge_withGapEqualToThreshold_shouldMerge() -> Result<()> {
    let entries = vec![
        entry(1, "00:00:00,000", "00:00:01,000", "x"),
        entry(2, "00:00:03,000", "00:00:04,000", "y"),
    ];

    assert_eq!(merge_entries(&entries, 2.0)?.len(), 1);
    Ok(())
}

/// Test that one millisecond above the threshold splits
#[test]
fn test_merge_withGapOneMillisecondAboveThreshold_shouldSplit() -> Result<()> {
    let entries = vec![
        entry(1, "00:00:00,000", "00:00:01,000", "x"),
        entry(2, "00:00:03,001", "00:00:04,000", "y"),
    ];

    assert_eq!(merge_entries(&entries, 2.0)?.len(), 2);
    Ok(())
}

/// Test fractional thresholds at their exact boundary
#[test]
fn test_merge_withFractionalThreshold_shouldCompareExactly() -> Result<()> {
    let entries = entries_with_gaps(&[300, 301]);
    let spans = merge_entries(&entries, 0.3)?;

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text, "t1 t2");
    assert_eq!(spans[1].text, "t3");
    Ok(())
}

/// Test that a zero threshold only merges touching or overlapping entries
#[test]
fn test_merge_withZeroThreshold_shouldMergeTouchingEntries() -> Result<()> {
    let entries = entries_with_gaps(&[0, 1]);
    let spans = merge_entries(&entries, 0.0)?;

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].end_time, "00:00:02,000");
    Ok(())
}

/// Test that every entry text appears exactly once, in order
#[test]
fn test_merge_withMixedGaps_shouldConserveTextsInOrder() -> Result<()> {
    let entries = entries_with_gaps(&[500, 5_000, 2_000, 2_001, 0, 10_000]);
    let spans = merge_entries(&entries, DEFAULT_MAX_GAP_SECONDS)?;

    let from_spans: Vec<&str> = spans.iter().flat_map(|s| s.text.split(' ')).collect();
    let from_entries: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(from_spans, from_entries);

    assert!(spans.len() <= entries.len());
    assert_eq!(spans.len(), 4);
    Ok(())
}

/// Test that span start times follow input order
#[test]
fn test_merge_withMixedGaps_shouldPreserveOrder() -> Result<()> {
    let entries = entries_with_gaps(&[3_000, 3_000, 100, 3_000]);
    let spans = merge_entries(&entries, 2.0)?;

    let starts: Vec<u64> = spans
        .iter()
        .map(|s| timecode::to_millis(&s.start_time))
        .collect::<Result<_, _>>()?;
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
    assert_eq!(spans.len(), 4);
    Ok(())
}

/// Test that the gap is measured from the last absorbed entry, not the first
#[test]
fn test_merge_withChainOfShortGaps_shouldMergeWholeChain() -> Result<()> {
    let entries = entries_with_gaps(&[1_500, 1_500, 1_500, 1_500]);
    let spans = merge_entries(&entries, 2.0)?;

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].start_time, "00:00:00,000");
    assert_eq!(spans[0].end_time, entries[4].end_time);
    Ok(())
}

/// Test that an overlapping entry merges and its end time wins
#[test]
fn test_merge_withOverlap_shouldTakeLaterEntryEnd() -> Result<()> {
    let entries = vec![
        entry(1, "00:00:00,000", "00:00:05,000", "long"),
        entry(2, "00:00:01,000", "00:00:02,000", "inner"),
    ];
    let spans = merge_entries(&entries, 2.0)?;

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].end_time, "00:00:02,000");
    assert_eq!(spans[0].text, "long inner");
    Ok(())
}

/// Test that a malformed start time in the first entry fails the merge
#[test]
fn test_merge_withMalformedFirstStart_shouldFail() {
    let entries = vec![entry(1, "bad", "00:00:01,000", "x")];
    assert!(matches!(merge_entries(&entries, 2.0), Err(SubtitleError::Format(_))));
}

/// Test the engine wrapper and its default
#[test]
fn test_mergeEngine_default_shouldUseTwoSeconds() -> Result<()> {
    let engine = MergeEngine::default();
    assert_eq!(engine.max_gap_seconds(), 2.0);

    let engine = MergeEngine::new(10.0)?;
    let entries = entries_with_gaps(&[5_000, 5_000]);
    assert_eq!(engine.merge(&entries)?.len(), 1);
    Ok(())
}

/// Test threshold validation
#[test]
fn test_mergeEngine_new_withNegativeOrNan_shouldFail() {
    assert!(matches!(MergeEngine::new(-0.5), Err(SubtitleError::InvalidThreshold(_))));
    assert!(matches!(MergeEngine::new(f64::NAN), Err(SubtitleError::InvalidThreshold(_))));
    assert!(matches!(MergeEngine::new(f64::INFINITY), Err(SubtitleError::InvalidThreshold(_))));
    assert!(MergeEngine::new(0.0).is_ok());
}

/// Test that merging keeps every character of multi-word, multibyte texts
#[test]
fn test_merge_withMultibyteTexts_shouldConserveCharacterTotal() -> Result<()> {
    let entries = vec![
        entry(1, "00:00:00,000", "00:00:01,000", "大家好 欢迎收看"),
        entry(2, "00:00:01,500", "00:00:02,500", "今天聊聊 Rust"),
        entry(3, "00:00:09,000", "00:00:10,000", "所有权 与 借用"),
        entry(4, "00:00:10,200", "00:00:11,000", "café déjà vu"),
        entry(5, "00:00:20,000", "00:00:21,000", "下期再见"),
    ];
    let spans = merge_entries(&entries, 2.0)?;
    assert_eq!(spans.len(), 3);

    let non_space = |s: &str| s.chars().filter(|c| *c != ' ').count();
    let input_total: usize = entries.iter().map(|e| non_space(&e.text)).sum();
    let span_total: usize = spans.iter().map(|s| non_space(&s.text)).sum();
    assert_eq!(span_total, input_total);

    let joined_total: usize = entries.iter().map(|e| e.text.chars().count()).sum();
    let span_chars: usize = spans.iter().map(|s| s.text.chars().count()).sum();
    assert_eq!(span_chars, joined_total + (entries.len() - spans.len()));

    assert_eq!(spans[0].text, "大家好 欢迎收看 今天聊聊 Rust");
    Ok(())
}
