use std::fs;
use std::path::{Path, PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use log::{debug, info};

use crate::errors::SubtitleError;
use crate::file_utils::{FileManager, SubtitleFormat};
use crate::merge::{MergeEngine, MergedSpan};

// @module: Subtitle parsing and document assembly

// @const: Blank-line block separator
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").expect("block separator regex is valid")
});

// @const: SRT time range line, anchored at the start only
static TIME_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3}) --> ([0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3})")
        .expect("time range regex is valid")
});

// @struct: Single parsed caption block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionEntry {
    // @field: Index line as written in the source
    pub index: String,

    // @field: HH:MM:SS,mmm
    pub start_time: String,

    // @field: HH:MM:SS,mmm
    pub end_time: String,

    // @field: Caption lines joined with a space
    pub text: String,
}

impl CaptionEntry {
    /// Creates a new caption entry
    pub fn new(
        index: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        CaptionEntry {
            index: index.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            text: text.into(),
        }
    }
}

/// Parse SRT content into caption entries.
///
/// Blocks with fewer than three lines, or whose second line is not a
/// `TIME --> TIME` range, are dropped without raising an error. Real caption
/// files often end with such leftovers.
pub fn parse_srt_string(content: &str) -> Vec<CaptionEntry> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (block_no, block) in BLOCK_SEPARATOR.split(content.trim()).enumerate() {
        let lines: Vec<&str> = block.trim().lines().collect();
        if lines.len() < 3 {
            debug!("Skipping block {}: only {} line(s)", block_no + 1, lines.len());
            skipped += 1;
            continue;
        }

        let Some(caps) = TIME_RANGE_REGEX.captures(lines[1]) else {
            debug!("Skipping block {}: no time range in {:?}", block_no + 1, lines[1]);
            skipped += 1;
            continue;
        };

        entries.push(CaptionEntry {
            index: lines[0].to_string(),
            start_time: caps[1].to_string(),
            end_time: caps[2].to_string(),
            text: lines[2..].join(" "),
        });
    }

    if skipped > 0 {
        debug!("Parsed {} caption entries, skipped {} malformed block(s)", entries.len(), skipped);
    }

    entries
}

/// Read and parse an SRT file. Only I/O and decoding problems are errors.
pub fn parse_srt_file<P: AsRef<Path>>(path: P) -> Result<Vec<CaptionEntry>, SubtitleError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| SubtitleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_srt_string(&content))
}

/// Join the text of every span with a single space, in order
pub fn extract_full_text(spans: &[MergedSpan]) -> String {
    spans
        .iter()
        .map(|span| span.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merged subtitles of one file plus the text handed to the summarizer
#[derive(Debug, Clone, Serialize)]
pub struct SubtitleDocument {
    /// Source filename
    pub source_file: PathBuf,

    /// Merged spans in source order
    pub spans: Vec<MergedSpan>,

    /// All span texts joined, untruncated
    pub full_text: String,
}

impl SubtitleDocument {
    /// Build a document from SRT content already in memory
    pub fn from_srt_string(
        source_file: impl Into<PathBuf>,
        content: &str,
        engine: &MergeEngine,
    ) -> Result<Self, SubtitleError> {
        let entries = parse_srt_string(content);
        Self::from_entries(source_file, &entries, engine)
    }

    /// Build a document from parsed entries
    pub fn from_entries(
        source_file: impl Into<PathBuf>,
        entries: &[CaptionEntry],
        engine: &MergeEngine,
    ) -> Result<Self, SubtitleError> {
        let spans = engine.merge(entries)?;
        let full_text = extract_full_text(&spans);

        Ok(SubtitleDocument {
            source_file: source_file.into(),
            spans,
            full_text,
        })
    }

    /// Load a subtitle file, rejecting anything that is not SRT before parsing
    pub fn from_file<P: AsRef<Path>>(path: P, engine: &MergeEngine) -> Result<Self, SubtitleError> {
        let path = path.as_ref();

        match FileManager::subtitle_format(path) {
            SubtitleFormat::Srt => {}
            other => {
                return Err(SubtitleError::UnsupportedFormat {
                    extension: other.extension().to_string(),
                    path: path.to_path_buf(),
                });
            }
        }

        let entries = parse_srt_file(path)?;
        let document = Self::from_entries(path, &entries, engine)?;

        info!(
            "Processed {}: {} entries merged into {} spans ({} chars)",
            path.display(),
            entries.len(),
            document.spans.len(),
            document.full_text.chars().count()
        );

        Ok(document)
    }

    /// Whether the document carries any text at all
    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }
}
