use anyhow::{anyhow, Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::downloader::{SubtitleSource, YuttoDownloader};
use crate::errors::{DownloadError, ProviderError};
use crate::merge::MergeEngine;
use crate::report::HtmlReport;
use crate::subtitle_processor::SubtitleDocument;
use crate::summarizer::{Summarizer, VideoSummary};
use crate::video::VideoReference;

// @module: Application controller for the summary pipeline

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    // @field: Video that was summarized
    pub video: VideoReference,

    // @field: Subtitle file that was processed
    pub subtitle_file: PathBuf,

    // @field: Number of merged spans
    pub span_count: usize,

    // @field: Generated summary
    pub summary: VideoSummary,

    // @field: Written HTML report
    pub report_path: PathBuf,
}

impl PipelineOutcome {
    /// `file://` link to the report
    pub fn report_url(&self) -> String {
        let absolute = std::path::absolute(&self.report_path).unwrap_or_else(|_| self.report_path.clone());
        format!("file://{}", absolute.display())
    }
}

/// Main application controller: download, process, summarize, render
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Merge engine built from the configured threshold
    merge_engine: MergeEngine,

    // @field: LLM summarizer
    summarizer: Summarizer,

    // @field: Subtitle source for online videos
    source: Arc<dyn SubtitleSource>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let settings = config
            .llm_settings()
            .context("Failed to resolve summary provider settings")?;
        let summarizer = Summarizer::from_settings(&settings, &config.summary.common);
        let source = Arc::new(YuttoDownloader::new(
            config.download.tool.clone(),
            config.download.timeout_secs,
            config.download.output_dir.clone(),
        ));

        Self::with_components(config, summarizer, source)
    }

    /// Create a controller around explicit collaborators
    pub fn with_components(config: Config, summarizer: Summarizer, source: Arc<dyn SubtitleSource>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let merge_engine = MergeEngine::new(config.subtitle.max_gap_seconds)?;

        Ok(Self {
            config,
            merge_engine,
            summarizer,
            source,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Download the subtitles of `video_url` and summarize them
    pub async fn run(&self, video_url: &str, sessdata: &str) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let video = VideoReference::parse(video_url);
        info!("Summarizing {} (id: {})", video, video.id_or_unknown());

        let spinner = Self::spinner("Downloading subtitles...");
        let downloaded = self.source.fetch(&video, sessdata).await;
        spinner.finish_and_clear();
        let downloaded = downloaded?;
        info!("Subtitles downloaded: {} file(s)", downloaded.subtitle_files.len());

        let subtitle_file = downloaded
            .first()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!(DownloadError::NoSubtitles(downloaded.output_dir.clone())))?;

        // The downloaded directory must outlive processing of the file
        let outcome = self.summarize_file(&subtitle_file, video).await;
        drop(downloaded);

        let outcome = outcome?;
        info!("Done in {}", Self::format_duration(started.elapsed()));
        Ok(outcome)
    }

    /// Check that the configured provider answers before any download
    pub async fn check_connection(&self) -> Result<()> {
        let provider = self.summarizer.provider_name().to_string();
        let spinner = Self::spinner(&format!("Checking connection to {}...", provider));
        let result = self.summarizer.test_connection().await;
        spinner.finish_and_clear();

        result.with_context(|| format!("Connection check failed for {} ({})", provider, self.summarizer.model()))?;
        info!("{} is reachable with model {}", provider, self.summarizer.model());
        Ok(())
    }

    /// Summarize a subtitle file already on disk
    pub async fn run_local<P: AsRef<Path>>(&self, subtitle_file: P, video_url: Option<&str>) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let subtitle_file = subtitle_file.as_ref();
        if !subtitle_file.is_file() {
            return Err(anyhow!("Subtitle file does not exist: {}", subtitle_file.display()));
        }

        let video = match video_url {
            Some(url) => VideoReference::parse(url),
            None => {
                let stem = subtitle_file
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                VideoReference::parse(&stem)
            }
        };

        let outcome = self.summarize_file(subtitle_file, video).await?;
        info!("Done in {}", Self::format_duration(started.elapsed()));
        Ok(outcome)
    }

    async fn summarize_file(&self, subtitle_file: &Path, video: VideoReference) -> Result<PipelineOutcome> {
        let document = SubtitleDocument::from_file(subtitle_file, &self.merge_engine)
            .with_context(|| format!("Failed to process subtitles: {}", subtitle_file.display()))?;
        if document.is_empty() {
            return Err(anyhow!("No captions found in {}", subtitle_file.display()));
        }
        debug!("Full text: {} characters", document.full_text.chars().count());

        let spinner = Self::spinner(&format!(
            "Generating summary with {} ({})...",
            self.summarizer.provider_name(),
            self.summarizer.model()
        ));
        let summary = self.summarizer.summarize(&document.full_text, &video).await;
        spinner.finish_and_clear();
        let summary = summary.context("Failed to generate summary")?;

        let report_path = HtmlReport::write(&self.config.output.dir, &summary, &video, Local::now().naive_local())?;

        Ok(PipelineOutcome {
            video,
            subtitle_file: subtitle_file.to_path_buf(),
            span_count: document.spans.len(),
            summary,
            report_path,
        })
    }

    /// Troubleshooting hints for a failed run
    pub fn hint_for_error(err: &anyhow::Error) -> Vec<String> {
        let mut hints = Vec::new();

        for cause in err.chain() {
            if let Some(download) = cause.downcast_ref::<DownloadError>() {
                match download {
                    DownloadError::MissingSessdata => hints.push(Self::sessdata_hint()),
                    DownloadError::ToolMissing { tool, .. } => hints.push(Self::install_hint(tool)),
                    DownloadError::ToolFailed { stderr, .. } if stderr.to_lowercase().contains("sessdata") => {
                        hints.push(Self::sessdata_hint())
                    }
                    _ => {}
                }
            }

            if let Some(ProviderError::AuthenticationError(_)) = cause.downcast_ref::<ProviderError>() {
                hints.push("The API key was rejected. Check --api-key or the provider's API key environment variable.".to_string());
            }
        }

        if hints.is_empty() {
            let message = format!("{:#}", err);
            if message.contains("SESSDATA") {
                hints.push(Self::sessdata_hint());
            } else if message.to_lowercase().contains("yutto") {
                hints.push(Self::install_hint("yutto"));
            }
        }

        hints.dedup();
        hints
    }

    fn sessdata_hint() -> String {
        "SESSDATA may be missing or expired. Log in to bilibili.com, open the developer tools \
         (F12) -> Application -> Cookies and copy the SESSDATA value."
            .to_string()
    }

    fn install_hint(tool: &str) -> String {
        format!("Make sure {} is installed and on PATH, e.g. `pip install {}`.", tool, tool)
    }

    /// Log a failed run with its troubleshooting hints
    pub fn report_failure(err: &anyhow::Error) {
        error!("{:#}", err);
        for hint in Self::hint_for_error(err) {
            warn!("{}", hint);
        }
    }

    fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    fn format_duration(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        let millis = duration.subsec_millis();

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, millis)
        }
    }
}
