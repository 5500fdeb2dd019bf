use anyhow::{Result, Context};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    /// Find files with a specific extension under a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let wanted = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
            {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Classify a subtitle file by its extension
    pub fn subtitle_format<P: AsRef<Path>>(path: P) -> SubtitleFormat {
        let ext = path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "srt" => SubtitleFormat::Srt,
            "ass" | "ssa" => SubtitleFormat::Ass,
            "vtt" => SubtitleFormat::WebVtt,
            _ => SubtitleFormat::Unknown(ext),
        }
    }
}

/// Caption file formats the tool can recognize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SubRip, the only format that can be processed
    Srt,
    /// Advanced SubStation Alpha
    Ass,
    /// WebVTT
    WebVtt,
    /// Anything else, with the extension that was found
    Unknown(String),
}

impl SubtitleFormat {
    /// Lowercase extension, empty when the file had none
    pub fn extension(&self) -> &str {
        match self {
            Self::Srt => "srt",
            Self::Ass => "ass",
            Self::WebVtt => "vtt",
            Self::Unknown(ext) => ext,
        }
    }
}
