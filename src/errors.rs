/*!
 * Error types for the subdigest application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the subtitle core (timecodes, parsing, merging)
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A timecode did not match `HH:MM:SS,mmm`
    #[error("Invalid timecode format: '{0}' (expected HH:MM:SS,mmm)")]
    Format(String),

    /// The subtitle file is not in a supported caption format
    #[error("Unsupported subtitle format: '{extension}' ({path})")]
    UnsupportedFormat {
        /// Extension found on the file, lowercase, without the dot
        extension: String,
        /// Offending file
        path: PathBuf,
    },

    /// The merge threshold is negative or not a finite number
    #[error("Invalid merge threshold: {0} seconds")]
    InvalidThreshold(f64),

    /// The subtitle file could not be read or decoded
    #[error("Failed to read subtitle file {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while acquiring subtitles for a video
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The session token required by the downloader is empty
    #[error("SESSDATA is required to download subtitles")]
    MissingSessdata,

    /// The downloader binary could not be started
    #[error("Downloader '{tool}' is not installed or not in PATH: {message}")]
    ToolMissing {
        /// Program name
        tool: String,
        /// Spawn error
        message: String,
    },

    /// The downloader exited with a failure status
    #[error("Downloader '{tool}' failed: {stderr}")]
    ToolFailed {
        /// Program name
        tool: String,
        /// Captured standard error
        stderr: String,
    },

    /// The downloader did not finish in time
    #[error("Downloader '{tool}' timed out after {secs} seconds")]
    Timeout {
        /// Program name
        tool: String,
        /// Configured timeout
        secs: u64,
    },

    /// The downloader finished but produced no subtitle file
    #[error("No subtitle files found in {0}")]
    NoSubtitles(PathBuf),

    /// The output directory could not be prepared
    #[error("Failed to prepare output directory: {0}")]
    OutputDir(#[from] std::io::Error),
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while producing a structured summary
#[derive(Error, Debug)]
pub enum SummaryError {
    /// The provider call failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model answered with no text at all
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The response parsed as JSON but is missing a required field
    #[error("Summary is missing required field: {0}")]
    MissingField(String),

    /// The response is not valid JSON
    #[error("Response is not valid JSON: {0}")]
    StrictDecode(String),

    /// No JSON object could be recovered from the free-text response
    #[error("Could not recover a JSON object from the response: {0}")]
    LenientDecode(String),
}

/// Errors that can occur while writing the HTML report
#[derive(Error, Debug)]
pub enum RenderError {
    /// The report file could not be written
    #[error("Failed to write report {path}: {source}")]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from subtitle acquisition
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from summary generation
    #[error("Summary error: {0}")]
    Summary(#[from] SummaryError),

    /// Error from report rendering
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
