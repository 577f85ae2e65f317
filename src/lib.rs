/*!
 * # bisub - bilingual subtitles for streamed video
 *
 * A Rust library that overlays corrected, translated captions on a video.
 *
 * ## Features
 *
 * - Fetch and parse timed-text caption tracks
 * - Regroup raw cues into display-sized subtitles
 * - Correct and translate subtitles in batches using various AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI API (and LM Studio)
 *   - Anthropic API
 * - Bounded retry with linear backoff for every batch
 * - Per-video translation cache persisted in SQLite
 * - Playback synchronization that resolves the lines on screen
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `captions`: Caption track fetching, parsing and merging
 * - `translation`: The batch pipeline:
 *   - `translation::prompts`: Prompt construction
 *   - `translation::extractor`: Response extraction
 *   - `translation::retry`: Retry with backoff
 *   - `translation::batch`: Batch scheduling
 *   - `translation::cache`: Per-video translation cache
 *   - `translation::events`: Progress status and observers
 * - `playback`: Selection of the lines to display at a playback time
 * - `providers`: Client implementations for various LLM providers
 * - `database`: SQLite persistence of translation caches
 * - `session`: Video session lifecycle
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod captions;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod playback;
pub mod providers;
pub mod session;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use captions::{MergedSubtitle, RawCue, SegmentMerger, TrackFetcher};
pub use errors::{AppError, ExtractionError, ProviderError, TrackError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match};
pub use playback::{PlaybackClock, PlaybackSync, RenderLine, SharedClock};
pub use providers::Translator;
pub use session::{PrepareOutcome, SessionManager, VideoSession};
pub use translation::{BatchScheduler, TranslationCache, TranslationRecord};
