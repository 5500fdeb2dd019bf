/*!
 * Adjacency merge engine.
 *
 * Folds consecutive caption entries into larger spans whenever the silence
 * between the end of the current span and the start of the next entry is at
 * most `max_gap_seconds`. The comparison is inclusive, and a negative gap
 * (overlapping or out-of-order entries) always merges.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::subtitle_processor::CaptionEntry;
use crate::timecode;

/// Default merge threshold in seconds
pub const DEFAULT_MAX_GAP_SECONDS: f64 = 2.0;

/// Consecutive caption entries folded together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedSpan {
    /// Start of the first absorbed entry
    pub start_time: String,
    /// End of the most recently absorbed entry
    pub end_time: String,
    /// Member texts joined with a space
    pub text: String,
}

impl MergedSpan {
    fn from_entry(entry: &CaptionEntry) -> Self {
        MergedSpan {
            start_time: entry.start_time.clone(),
            end_time: entry.end_time.clone(),
            text: entry.text.clone(),
        }
    }

    fn absorb(&mut self, entry: &CaptionEntry) {
        self.end_time.clone_from(&entry.end_time);
        self.text.push(' ');
        self.text.push_str(&entry.text);
    }
}

/// Merge engine configured with a gap threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEngine {
    max_gap_seconds: f64,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self {
            max_gap_seconds: DEFAULT_MAX_GAP_SECONDS,
        }
    }
}

impl MergeEngine {
    /// Create an engine; the threshold must be finite and non-negative
    pub fn new(max_gap_seconds: f64) -> Result<Self, SubtitleError> {
        if !max_gap_seconds.is_finite() || max_gap_seconds < 0.0 {
            return Err(SubtitleError::InvalidThreshold(max_gap_seconds));
        }
        Ok(Self { max_gap_seconds })
    }

    /// Configured threshold in seconds
    pub fn max_gap_seconds(&self) -> f64 {
        self.max_gap_seconds
    }

    /// Merge entries in a single left-to-right pass
    pub fn merge(&self, entries: &[CaptionEntry]) -> Result<Vec<MergedSpan>, SubtitleError> {
        merge_entries(entries, self.max_gap_seconds)
    }
}

/// Merge `entries` into spans using `max_gap_seconds` as an inclusive threshold.
///
/// Fails on the first malformed timecode; nothing merged so far is returned.
pub fn merge_entries(
    entries: &[CaptionEntry],
    max_gap_seconds: f64,
) -> Result<Vec<MergedSpan>, SubtitleError> {
    let Some((first, rest)) = entries.split_first() else {
        return Ok(Vec::new());
    };

    // Gaps are computed in integer milliseconds so exact thresholds merge
    let mut spans = Vec::new();
    let mut current = MergedSpan::from_entry(first);
    let mut current_end_ms = timecode::to_millis(&first.end_time)?;
    timecode::to_millis(&first.start_time)?;

    for entry in rest {
        let start_ms = timecode::to_millis(&entry.start_time)?;
        let end_ms = timecode::to_millis(&entry.end_time)?;
        let gap = (start_ms as i64 - current_end_ms as i64) as f64 / 1000.0;

        if gap <= max_gap_seconds {
            if gap < 0.0 {
                debug!(
                    "Entry {} overlaps the current span by {:.3}s, merging",
                    entry.index, -gap
                );
            }
            current.absorb(entry);
        } else {
            spans.push(current);
            current = MergedSpan::from_entry(entry);
        }
        current_end_ms = end_ms;
    }

    spans.push(current);

    debug!(
        "Merged {} entries into {} spans (max gap {}s)",
        entries.len(),
        spans.len(),
        max_gap_seconds
    );

    Ok(spans)
}
