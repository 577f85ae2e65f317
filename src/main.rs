// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;

use bisub::app_config::{Config, LogLevel, TranslationProvider};
use bisub::database::CacheRepository;
use bisub::playback::{FixedClock, RenderLine};
use bisub::providers::build_translator;
use bisub::session::{PrepareOutcome, SessionManager};
use bisub::translation::{Observers, PipelineEvent, PipelineObserver, ProcessingStatus};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
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

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a video's caption track and print the lines at given times
    Run(RunArgs),

    /// Inspect or clear the persisted translation cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },

    /// Generate shell completions for bisub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// URL of the timed-text caption track
    #[arg(value_name = "TRACK_URL")]
    track_url: String,

    /// Video id the translations are cached under
    #[arg(long)]
    video_id: String,

    /// Playback position in seconds to print (repeatable)
    #[arg(long = "at", value_name = "SECONDS")]
    at: Vec<f64>,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// List cached videos
    List,

    /// Show cache statistics
    Stats,

    /// Delete the cache of one video, or of every video
    Clear {
        /// Only clear this video
        #[arg(long)]
        video_id: Option<String>,
    },
}

/// bisub - bilingual subtitles for streamed video
///
/// Fetches a video's caption track, regroups the cues into readable
/// subtitles, corrects and translates them in batches with an AI provider,
/// and caches the result per video.
#[derive(Parser, Debug)]
#[command(name = "bisub")]
#[command(version)]
#[command(about = "Bilingual subtitles with AI correction and translation")]
#[command(long_about = "bisub fetches a timed-text caption track, merges its cues into display-sized subtitles, \
translates them in batches with an AI provider and caches the result per video.

EXAMPLES:
    bisub run https://example.com/track.xml --video-id abc123 --at 12.5 --at 40
    bisub -p openai -m gpt-4o-mini -t ja run URL --video-id abc123
    bisub cache list
    bisub cache clear --video-id abc123
    bisub completions bash > bisub.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh', 'es', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
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

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
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
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// @struct: Progress bar fed by pipeline events
struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} subtitles ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        Self { bar }
    }
}

impl PipelineObserver for ProgressBarObserver {
    fn on_progress(&mut self, status: &ProcessingStatus) {
        self.bar.set_length(status.total as u64);
        self.bar.set_position(status.processed as u64);
    }

    fn on_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::CacheHit { entries } => {
                self.bar.finish_with_message(format!("loaded {} cached translations", entries));
            }
            PipelineEvent::BatchStarted { index, total, .. } => {
                self.bar.set_message(format!("batch {}/{}", index + 1, total));
            }
            PipelineEvent::BatchRetrying { index, attempt, delay_ms, .. } => {
                self.bar.set_message(format!(
                    "batch {} retry {} in {}ms",
                    index + 1,
                    attempt,
                    delay_ms
                ));
            }
            PipelineEvent::Completed { .. } => self.bar.finish_with_message("done"),
            PipelineEvent::Aborted { .. } => self.bar.abandon_with_message("aborted"),
            _ => {}
        }
    }
}

// @struct: Prints rendered lines to stdout
struct StdoutRenderObserver;

impl PipelineObserver for StdoutRenderObserver {
    fn on_render(&mut self, lines: &[RenderLine]) {
        if lines.is_empty() {
            println!("    (no subtitle)");
        }
        for line in lines {
            println!(
                "    [{} --> {}] {}\n    {}",
                format_timestamp(line.start_ms),
                format_timestamp(line.end_ms),
                line.original,
                line.translation
            );
        }
    }
}

// @returns: mm:ss.mmm
fn format_timestamp(ms: u64) -> String {
    format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install the logger once; the effective level is raised or lowered later
    // through the global max level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = &cli.log_level {
        let level: LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "bisub", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    match cli.command {
        Commands::Run(args) => run_video(config, args).await,
        Commands::Cache { action } => run_cache(config, action).await,
        Commands::Completions { .. } => Ok(()),
    }
}

// @returns: Configuration with CLI overrides applied and validated
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &cli.model {
        let provider = config.translation.provider;
        config.translation.provider_config_mut(provider).model = model.clone();
    }

    if let Some(source_lang) = &cli.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &cli.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn open_repository(config: &Config) -> Result<CacheRepository> {
    CacheRepository::open(config.cache.database_path.as_deref(), &config.cache.key_prefix)
        .context("Failed to open translation cache")
}

async fn run_video(config: Config, args: RunArgs) -> Result<()> {
    let translator = build_translator(&config.translation);
    info!(
        "Using {} ({}) for {} -> {}",
        config.translation.provider,
        config.translation.get_model(),
        config.source_language,
        config.target_language
    );

    let store = open_repository(&config)?;
    let mut manager = SessionManager::new(&config, translator, Box::new(store))?;

    let mut observers = Observers::new();
    observers.subscribe(Box::new(ProgressBarObserver::new()));
    observers.subscribe(Box::new(StdoutRenderObserver));

    let outcome = manager
        .open_video(&args.video_id, &args.track_url, observers)
        .await?;

    match &outcome {
        PrepareOutcome::CacheHit { entries } => info!("Using {} cached translations", entries),
        PrepareOutcome::Translated { translated } => info!("Translated {} subtitles", translated),
        PrepareOutcome::Aborted { processed, total, error } => {
            error!("Translation stopped at {}/{}: {}", processed, total, error)
        }
    }

    if let Some(session) = manager.current() {
        let session = session.info();
        info!(
            "Video {}: {} subtitles, {} translations in memory",
            session.video_id, session.subtitle_count, session.cached_entries
        );
    }

    for secs in &args.at {
        println!("{}", format_timestamp(bisub::playback::secs_to_ms(*secs)));
        manager.render(&FixedClock(*secs));
    }

    manager.close();

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(anyhow!("Translation did not complete; nothing was cached"))
    }
}

async fn run_cache(config: Config, action: CacheCommand) -> Result<()> {
    let repo = open_repository(&config)?;

    match action {
        CacheCommand::List => {
            let videos = repo.list_videos().await?;
            if videos.is_empty() {
                println!("No cached videos");
            }
            for video in videos {
                println!("{}\t{} subtitles\t{}", video.video_id, video.entry_count, video.updated_at);
            }
        }
        CacheCommand::Stats => {
            println!("{}", repo.stats().await?);
            println!("Database: {}", repo.connection().path().display());
        }
        CacheCommand::Clear { video_id: Some(video_id) } => {
            if repo.delete_video(&video_id).await? {
                info!("Cleared cache for video {}", video_id);
            } else {
                warn!("No cache found for video {}", video_id);
            }
        }
        CacheCommand::Clear { video_id: None } => {
            let removed = repo.clear().await?;
            info!("Cleared {} cached videos", removed);
        }
    }

    Ok(())
}
