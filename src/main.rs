// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use subdigest::app_config::{self, Config, SummaryProvider};
use subdigest::app_controller::{Controller, PipelineOutcome};

/// CLI Wrapper for SummaryProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSummaryProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
}

impl From<CliSummaryProvider> for SummaryProvider {
    fn from(cli_provider: CliSummaryProvider) -> Self {
        match cli_provider {
            CliSummaryProvider::OpenAI => SummaryProvider::OpenAI,
            CliSummaryProvider::Anthropic => SummaryProvider::Anthropic,
            CliSummaryProvider::Ollama => SummaryProvider::Ollama,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for subdigest
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subdigest - video subtitle summarizer
///
/// Downloads the subtitles of a Bilibili video, merges them into readable
/// text and asks an LLM for a structured summary rendered as HTML.
#[derive(Parser, Debug)]
#[command(name = "subdigest")]
#[command(version)]
#[command(about = "Summarize Bilibili videos from their subtitles")]
#[command(long_about = "subdigest downloads the subtitles of a Bilibili video with yutto, merges them \
into continuous text and asks an LLM for a structured summary, written as an HTML report.

EXAMPLES:
    subdigest https://www.bilibili.com/video/BV1xx411c7mD -S <SESSDATA>
    subdigest --subtitle-file talk.srt                      # Summarize a local SRT file
    subdigest -p ollama -m qwen2.5 <URL> -S <SESSDATA>      # Use a local model
    subdigest --base-url https://api.example.com/v1 <URL>   # OpenAI-compatible server
    subdigest completions bash > subdigest.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Command line options override the file.

SUPPORTED PROVIDERS:
    openai    - OpenAI API (OPENAI_API_KEY, default model gpt-3.5-turbo)
    anthropic - Anthropic API (ANTHROPIC_API_KEY)
    ollama    - Local Ollama server (http://localhost:11434)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Video URL or id to summarize
    #[arg(value_name = "VIDEO_URL")]
    video_url: Option<String>,

    /// Bilibili SESSDATA cookie used to download subtitles
    #[arg(short = 'S', long, env = "SESSDATA", hide_env_values = true)]
    sessdata: Option<String>,

    /// Summarize a local subtitle file instead of downloading
    #[arg(long, value_name = "PATH")]
    subtitle_file: Option<PathBuf>,

    /// Summary provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSummaryProvider>,

    /// Model name to use for the summary
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the provider
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL of the provider API
    #[arg(long)]
    base_url: Option<String>,

    /// Check that the summary provider is reachable, then exit
    #[arg(long)]
    check: bool,

    /// Merge captions separated by at most this many seconds
    #[arg(long, value_name = "SECONDS")]
    max_gap: Option<f64>,

    /// Directory for the HTML report
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling, the effective level is set with log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subdigest", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli)?;

    // If log level was not set via command line, update it from config now
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }
    debug!("Configuration: {:?}", config.summary.provider);

    if cli.check {
        return match check(config).await {
            Ok(()) => {
                println!("✅ Provider connection OK");
                Ok(())
            }
            Err(err) => {
                Controller::report_failure(&err);
                std::process::exit(1);
            }
        };
    }

    let result = run(&cli, config).await;
    match result {
        Ok(outcome) => {
            println!();
            println!("{}", outcome.summary.preview());
            println!();
            println!("✅ Summary written: {}", outcome.report_url());
            Ok(())
        }
        Err(err) => {
            Controller::report_failure(&err);
            std::process::exit(1);
        }
    }
}

async fn check(config: Config) -> Result<()> {
    Controller::with_config(config)?.check_connection().await
}

async fn run(cli: &CommandLineOptions, config: Config) -> Result<PipelineOutcome> {
    let controller = Controller::with_config(config)?;

    match (&cli.subtitle_file, &cli.video_url) {
        (Some(path), video_url) => controller.run_local(path, video_url.as_deref()).await,
        (None, Some(video_url)) => {
            let sessdata = cli.sessdata.as_deref().unwrap_or_default();
            controller.run(video_url, sessdata).await
        }
        (None, None) => Err(anyhow!("VIDEO_URL or --subtitle-file is required")),
    }
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    // Override config with CLI options if provided
    if let Some(provider) = &cli.provider {
        config.summary.provider = provider.clone().into();
    }

    if cli.model.is_some() || cli.api_key.is_some() || cli.base_url.is_some() {
        let provider_config = config.summary.active_provider_config_mut();
        if let Some(model) = &cli.model {
            provider_config.model = model.clone();
        }
        if let Some(api_key) = &cli.api_key {
            provider_config.api_key = api_key.clone();
        }
        if let Some(base_url) = &cli.base_url {
            provider_config.endpoint = base_url.clone();
        }
    }

    if let Some(max_gap) = cli.max_gap {
        config.subtitle.max_gap_seconds = max_gap;
    }

    if let Some(output_dir) = &cli.output_dir {
        config.output.dir = output_dir.clone();
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
