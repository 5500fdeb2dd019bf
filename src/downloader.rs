/*!
 * Subtitle acquisition for online videos.
 *
 * The `SubtitleSource` trait hides where subtitles come from. The default
 * implementation shells out to `yutto`, a Bilibili downloader, and collects
 * the subtitle files it leaves behind.
 */

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

use crate::errors::DownloadError;
use crate::file_utils::FileManager;
use crate::video::VideoReference;

/// Default downloader program
pub const DEFAULT_TOOL: &str = "yutto";

/// Default downloader timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Subtitle files fetched for one video
#[derive(Debug)]
pub struct DownloadedSubtitles {
    /// Subtitle files found, SRT preferred over ASS, sorted by path
    pub subtitle_files: Vec<PathBuf>,

    /// Video the files belong to
    pub video: VideoReference,

    /// Directory the downloader wrote into
    pub output_dir: PathBuf,

    // Removed on drop when the directory is temporary
    _temp_dir: Option<TempDir>,
}

impl DownloadedSubtitles {
    /// Wrap files already present in `output_dir`
    pub fn new(subtitle_files: Vec<PathBuf>, video: VideoReference, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            subtitle_files,
            video,
            output_dir: output_dir.into(),
            _temp_dir: None,
        }
    }

    /// First subtitle file, the one the pipeline processes
    pub fn first(&self) -> Option<&Path> {
        self.subtitle_files.first().map(PathBuf::as_path)
    }

    /// Whether the output directory is deleted when this value is dropped
    pub fn is_temporary(&self) -> bool {
        self._temp_dir.is_some()
    }
}

/// Anything able to fetch subtitle files for a video
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    /// Fetch the subtitles of `video`, authenticating with `sessdata`
    async fn fetch(&self, video: &VideoReference, sessdata: &str) -> Result<DownloadedSubtitles, DownloadError>;
}

/// Subtitle source backed by the `yutto` command line tool
#[derive(Debug, Clone)]
pub struct YuttoDownloader {
    // @field: Program and leading arguments, e.g. `yutto` or `python -m yutto`
    tool: String,

    // @field: Subprocess timeout
    timeout_secs: u64,

    // @field: Fixed output directory, temporary when unset
    output_dir: Option<PathBuf>,
}

impl Default for YuttoDownloader {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: None,
        }
    }
}

impl YuttoDownloader {
    /// Create a downloader
    pub fn new(tool: impl Into<String>, timeout_secs: u64, output_dir: Option<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            timeout_secs,
            output_dir,
        }
    }

    /// Program name, used in messages
    pub fn program(&self) -> &str {
        self.tool.split_whitespace().next().unwrap_or(DEFAULT_TOOL)
    }

    /// Arguments passed after the tool's own leading arguments
    pub fn arguments(&self, video: &VideoReference, dir: &Path, sessdata: &str) -> Vec<String> {
        let mut args = vec![
            video.url.clone(),
            "--subtitle-only".to_string(),
            "--dir".to_string(),
            dir.to_string_lossy().to_string(),
        ];
        if !sessdata.is_empty() {
            args.push("--sessdata".to_string());
            args.push(sessdata.to_string());
        }
        args
    }

    /// Subtitle files under `dir`: every `.srt`, or every `.ass` when there is no SRT
    pub fn collect_subtitle_files(dir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
        let walk_error = |e: anyhow::Error| DownloadError::OutputDir(std::io::Error::other(e.to_string()));

        let srt = FileManager::find_files(dir, "srt").map_err(walk_error)?;
        if !srt.is_empty() {
            return Ok(srt);
        }

        let ass = FileManager::find_files(dir, "ass").map_err(walk_error)?;
        if !ass.is_empty() {
            warn!("No SRT subtitles found, falling back to {} ASS file(s)", ass.len());
            return Ok(ass);
        }

        Err(DownloadError::NoSubtitles(dir.to_path_buf()))
    }

    fn prepare_dir(&self) -> Result<(PathBuf, Option<TempDir>), DownloadError> {
        match &self.output_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let dir = std::path::absolute(dir)?;
                Ok((dir, None))
            }
            None => {
                let temp = tempfile::Builder::new().prefix("subdigest_").tempdir()?;
                Ok((temp.path().to_path_buf(), Some(temp)))
            }
        }
    }

    async fn run_tool(&self, args: &[String]) -> Result<(), DownloadError> {
        let mut parts = self.tool.split_whitespace();
        let program = parts.next().unwrap_or(DEFAULT_TOOL);

        let download_future = Command::new(program)
            .args(parts)
            .args(args)
            .kill_on_drop(true)
            .output();

        let timeout_duration = Duration::from_secs(self.timeout_secs);
        let output = tokio::select! {
            result = download_future => {
                result.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => DownloadError::ToolMissing {
                        tool: program.to_string(),
                        message: e.to_string(),
                    },
                    _ => DownloadError::ToolFailed {
                        tool: program.to_string(),
                        stderr: e.to_string(),
                    },
                })?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(DownloadError::Timeout {
                    tool: program.to_string(),
                    secs: self.timeout_secs,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("{} exited with {}: {}", program, output.status, stderr);
            return Err(DownloadError::ToolFailed {
                tool: program.to_string(),
                stderr,
            });
        }

        debug!("{} output: {}", program, String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }
}

#[async_trait]
impl SubtitleSource for YuttoDownloader {
    async fn fetch(&self, video: &VideoReference, sessdata: &str) -> Result<DownloadedSubtitles, DownloadError> {
        let sessdata = sessdata.trim();
        if sessdata.is_empty() {
            return Err(DownloadError::MissingSessdata);
        }

        let (dir, temp_dir) = self.prepare_dir()?;
        info!("Downloading subtitles for {} into {}", video, dir.display());

        self.run_tool(&self.arguments(video, &dir, sessdata)).await?;

        let subtitle_files = Self::collect_subtitle_files(&dir)?;
        info!("Found {} subtitle file(s)", subtitle_files.len());

        Ok(DownloadedSubtitles {
            subtitle_files,
            video: video.clone(),
            output_dir: dir,
            _temp_dir: temp_dir,
        })
    }
}
