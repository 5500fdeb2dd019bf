/*!
 * # subdigest - video subtitle summarizer
 *
 * A Rust library that turns the subtitles of a Bilibili video into a
 * structured summary and an HTML report.
 *
 * ## Features
 *
 * - Download subtitles with `yutto`
 * - Parse SRT caption blocks and merge adjacent captions into spans
 * - Summarize the subtitle text using various AI providers:
 *   - OpenAI API (or any compatible server)
 *   - Anthropic API
 *   - Ollama (local LLM)
 * - Render the summary as a self-contained HTML page
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: `HH:MM:SS,mmm` parsing and formatting
 * - `subtitle_processor`: SRT block parsing and full-text extraction
 * - `merge`: Adjacency merge engine
 * - `video`: Video URL and id handling
 * - `downloader`: Subtitle acquisition
 * - `providers`: Client implementations for various LLM providers
 * - `summarizer`: Prompting and decoding of structured summaries
 * - `report`: HTML report rendering
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod timecode;
pub mod subtitle_processor;
pub mod merge;
pub mod video;
pub mod downloader;
pub mod providers;
pub mod summarizer;
pub mod report;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, PipelineOutcome};
pub use merge::{MergeEngine, MergedSpan};
pub use subtitle_processor::{CaptionEntry, SubtitleDocument, extract_full_text, parse_srt_string};
pub use summarizer::{Summarizer, VideoSummary};
pub use video::VideoReference;
pub use errors::{AppError, DownloadError, ProviderError, RenderError, SubtitleError, SummaryError};
