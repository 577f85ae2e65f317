/*!
 * Batched correction and translation of merged subtitles.
 *
 * - `prompts`: Renders a batch into an instruction prompt
 * - `extractor`: Pulls the result array out of a free-form reply
 * - `retry`: Bounded retry with linear backoff
 * - `batch`: Splits subtitles into batches and drives them serially
 * - `cache`: Per-video map from original text to its translation
 * - `events`: Progress status and observer notifications
 */

pub mod batch;
pub mod cache;
pub mod events;
pub mod extractor;
pub mod prompts;
pub mod retry;

// Re-export main types for easier usage
pub use self::batch::{Batch, BatchScheduler, split_into_batches};
pub use self::cache::{TranslationCache, TranslationRecord, normalize_for_lookup};
pub use self::events::{Observers, PipelineEvent, PipelineObserver, ProcessingStatus, RecordingObserver};
pub use self::extractor::{ExtractedEntry, ResponseExtractor};
pub use self::prompts::TranslationRequestBuilder;
pub use self::retry::{RetryController, RetryNotice, RetryOutcome};
