/*!
 * Batch scheduling for subtitle translation.
 *
 * Merged subtitles are cut into contiguous batches and submitted strictly one
 * at a time: Builder, then Translator, then Extractor, then Cache. A batch's
 * records are committed together, and only once the batch succeeds, so the
 * cache never holds part of a batch. A batch that exhausts its retries stops
 * the run; later batches are never attempted.
 */

use std::time::Duration;

use log::{debug, error, info};

use crate::app_config::TranslationCommonConfig;
use crate::captions::MergedSubtitle;
use crate::errors::TranslationError;
use crate::providers::Translator;

use super::cache::{TranslationCache, TranslationRecord};
use super::events::{Observers, PipelineEvent, ProcessingStatus};
use super::extractor::ResponseExtractor;
use super::prompts::TranslationRequestBuilder;
use super::retry::RetryController;

/// Ordered slice of merged subtitles submitted in one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch<'a> {
    /// Zero-based position of this batch
    pub index: usize,

    /// Number of batches in the run
    pub total: usize,

    /// Subtitles in this batch
    pub items: &'a [MergedSubtitle],
}

impl<'a> Batch<'a> {
    pub fn new(index: usize, total: usize, items: &'a [MergedSubtitle]) -> Self {
        Self { index, total, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// Split subtitles into contiguous batches of `batch_size`
///
/// The batches cover the list exactly once and in order. A zero size is
/// treated as one.
pub fn split_into_batches(subtitles: &[MergedSubtitle], batch_size: usize) -> Vec<Batch<'_>> {
    let chunks = subtitles.chunks(batch_size.max(1));
    let total = chunks.len();
    chunks
        .enumerate()
        .map(|(index, items)| Batch::new(index, total, items))
        .collect()
}

/// Drives the batches of one video through translation
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    builder: TranslationRequestBuilder,
    extractor: ResponseExtractor,
    retry: RetryController,
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchScheduler {
    /// Create a scheduler from the common translation settings
    pub fn new(builder: TranslationRequestBuilder, config: &TranslationCommonConfig) -> Self {
        Self {
            builder,
            extractor: ResponseExtractor::new(),
            retry: RetryController::from_config(config),
            batch_size: config.batch_size.max(1),
            inter_batch_delay: Duration::from_millis(config.inter_batch_delay_ms),
        }
    }

    /// Replace the retry controller
    pub fn with_retry(mut self, retry: RetryController) -> Self {
        self.retry = retry;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Translate every subtitle, committing each successful batch to `cache`.
    ///
    /// `status` is reset for the run and `processed` grows by a batch's size
    /// only when that batch succeeds. Observers are notified after every batch
    /// outcome and see the cache after every commit, before the next batch is
    /// submitted. Returns the number of subtitles translated, or the error that
    /// stopped the run. The translator is cleaned up once either way.
    pub async fn run(
        &self,
        subtitles: &[MergedSubtitle],
        translator: &dyn Translator,
        cache: &mut TranslationCache,
        status: &mut ProcessingStatus,
        observers: &mut Observers,
    ) -> Result<usize, TranslationError> {
        let batches = split_into_batches(subtitles, self.batch_size);

        *status = ProcessingStatus {
            total: subtitles.len(),
            processed: 0,
            is_processing: true,
        };
        info!(
            "Translating {} subtitles in {} batches with {}",
            subtitles.len(),
            batches.len(),
            translator.name()
        );
        observers.event(PipelineEvent::Started {
            total_subtitles: subtitles.len(),
            total_batches: batches.len(),
        });
        observers.progress(status);

        let result = self
            .run_batches(subtitles, &batches, translator, cache, status, observers)
            .await;

        status.is_processing = false;
        observers.progress(status);
        match &result {
            Ok(translated) => {
                info!("Translation finished: {} subtitles", translated);
                observers.event(PipelineEvent::Completed {
                    translated: *translated,
                });
            }
            Err(e) => {
                error!(
                    "Translation aborted after {}/{} subtitles: {}",
                    status.processed, status.total, e
                );
                observers.event(PipelineEvent::Aborted {
                    processed: status.processed,
                    total: status.total,
                });
            }
        }

        translator.cleanup().await;
        result
    }

    async fn run_batches(
        &self,
        subtitles: &[MergedSubtitle],
        batches: &[Batch<'_>],
        translator: &dyn Translator,
        cache: &mut TranslationCache,
        status: &mut ProcessingStatus,
        observers: &mut Observers,
    ) -> Result<usize, TranslationError> {
        for batch in batches {
            observers.event(PipelineEvent::BatchStarted {
                index: batch.index,
                total: batch.total,
                size: batch.len(),
            });

            let prompt = self.builder.build(batch);
            let prompt = prompt.as_str();
            let extractor = &self.extractor;

            let outcome = self
                .retry
                .run(
                    batch.index,
                    |_| translate_batch(translator, extractor, prompt, batch.items),
                    |notice| {
                        observers.event(PipelineEvent::BatchRetrying {
                            index: notice.batch,
                            attempt: notice.attempt,
                            delay_ms: notice.delay.as_millis() as u64,
                            error: notice.error.to_string(),
                        })
                    },
                )
                .await;

            match outcome {
                Ok(outcome) => {
                    cache.extend(outcome.value);
                    status.processed += batch.len();
                    observers.commit(subtitles, cache);
                    debug!(
                        "Batch {}/{} committed after {} attempt(s)",
                        batch.index + 1,
                        batch.total,
                        outcome.attempts
                    );
                    observers.event(PipelineEvent::BatchCompleted {
                        index: batch.index,
                        total: batch.total,
                        attempts: outcome.attempts,
                    });
                    observers.progress(status);
                }
                Err(e) => {
                    observers.event(PipelineEvent::BatchFailed {
                        index: batch.index,
                        total: batch.total,
                        error: e.to_string(),
                    });
                    observers.progress(status);
                    return Err(e);
                }
            }

            if !batch.is_last() && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        Ok(status.processed)
    }
}

/// One attempt at a batch: prompt, reply, extraction, records
async fn translate_batch(
    translator: &dyn Translator,
    extractor: &ResponseExtractor,
    prompt: &str,
    items: &[MergedSubtitle],
) -> Result<Vec<(String, TranslationRecord)>, TranslationError> {
    let response = translator
        .translate(prompt)
        .await?
        .ok_or(TranslationError::NoResponse)?;

    let entries = extractor.extract(&response, items.len())?;

    Ok(items
        .iter()
        .zip(entries)
        .map(|(item, entry)| {
            let corrected_text = entry
                .corrected_text
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| item.text.clone());
            (item.text.clone(), TranslationRecord::new(corrected_text, entry.translation))
        })
        .collect())
}
