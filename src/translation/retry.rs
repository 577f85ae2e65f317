/*!
 * Bounded retry for batch submissions.
 *
 * A failed attempt is resubmitted while the error is retryable and the retry
 * budget lasts. The wait before retry `n` (1-based) is `base_delay * n`.
 */

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::app_config::TranslationCommonConfig;
use crate::errors::TranslationError;

/// Details of a failed attempt that is about to be retried
#[derive(Debug)]
pub struct RetryNotice<'a> {
    /// Batch being retried
    pub batch: usize,

    /// 1-based number of the retry about to run
    pub attempt: usize,

    /// Wait before the retry
    pub delay: Duration,

    /// Error of the failed attempt
    pub error: &'a TranslationError,
}

/// Successful result together with the number of attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: usize,
}

/// Wraps one batch submission with bounded retry and linear backoff
#[derive(Debug, Clone)]
pub struct RetryController {
    /// Retries allowed after the first attempt
    max_retries: usize,

    /// Unit of the linear backoff
    base_delay: Duration,
}

impl RetryController {
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &TranslationCommonConfig) -> Self {
        Self::new(
            config.retry_count as usize,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.base_delay.saturating_mul((attempt + 1) as u32)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent.
    ///
    /// `operation` receives the 0-based attempt number. `on_retry` is called
    /// before each wait. A spent budget yields
    /// [`TranslationError::RetriesExhausted`] wrapping the last error; a
    /// non-retryable error is returned unchanged.
    pub async fn run<T, F, Fut, R>(
        &self,
        batch: usize,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<RetryOutcome<T>, TranslationError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, TranslationError>>,
        R: FnMut(RetryNotice<'_>),
    {
        let mut attempt = 0;
        loop {
            let error = match operation(attempt).await {
                Ok(value) => {
                    return Ok(RetryOutcome {
                        value,
                        attempts: attempt + 1,
                    });
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                warn!("Batch {} failed with a non-retryable error: {}", batch, error);
                return Err(error);
            }

            if attempt >= self.max_retries {
                warn!(
                    "Batch {} failed after {} attempts: {}",
                    batch,
                    attempt + 1,
                    error
                );
                return Err(TranslationError::RetriesExhausted {
                    batch,
                    attempts: attempt + 1,
                    source: Box::new(error),
                });
            }

            let delay = self.delay_for(attempt);
            debug!(
                "Batch {} attempt {} failed ({}), retrying in {}ms",
                batch,
                attempt + 1,
                error,
                delay.as_millis()
            );
            on_retry(RetryNotice {
                batch,
                attempt: attempt + 1,
                delay,
                error: &error,
            });

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

impl Default for RetryController {
    fn default() -> Self {
        Self::from_config(&TranslationCommonConfig::default())
    }
}
