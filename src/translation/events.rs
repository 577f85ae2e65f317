/*!
 * Progress reporting for the batch pipeline.
 *
 * The scheduler never touches presentation state. It updates a
 * [`ProcessingStatus`] and publishes [`PipelineEvent`]s to whichever
 * [`PipelineObserver`]s the owning session has subscribed.
 */

use serde::Serialize;

use crate::captions::MergedSubtitle;
use crate::playback::{PlaybackClock, PlaybackSync, RenderLine};

use super::TranslationCache;

/// Progress of the translation pipeline for the current video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatus {
    /// Number of merged subtitles to translate
    pub total: usize,

    /// Number of merged subtitles whose batch succeeded
    pub processed: usize,

    /// Whether a pipeline run is in progress
    pub is_processing: bool,
}

impl ProcessingStatus {
    /// Percentage of subtitles processed, 0 when there is nothing to do
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.processed as f32 / self.total as f32 * 100.0
        }
    }
}

/// Notable moments of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The persisted cache was found; no batch will run
    CacheHit { entries: usize },

    /// A run started
    Started { total_subtitles: usize, total_batches: usize },

    /// A batch is about to be submitted for the first time
    BatchStarted { index: usize, total: usize, size: usize },

    /// A batch attempt failed and will be resubmitted
    BatchRetrying {
        index: usize,
        attempt: usize,
        delay_ms: u64,
        error: String,
    },

    /// A batch succeeded and its records were committed
    BatchCompleted { index: usize, total: usize, attempts: usize },

    /// A batch failed for good
    BatchFailed { index: usize, total: usize, error: String },

    /// Every batch succeeded
    Completed { translated: usize },

    /// The run stopped before the last batch
    Aborted { processed: usize, total: usize },
}

/// Subscriber for pipeline progress and playback rendering
pub trait PipelineObserver: Send {
    /// Called after every batch outcome and at the start and end of a run
    fn on_progress(&mut self, _status: &ProcessingStatus) {}

    /// Called for every pipeline event
    fn on_event(&mut self, _event: &PipelineEvent) {}

    /// Called with the lines to show for the current playback time
    fn on_render(&mut self, _lines: &[RenderLine]) {}

    /// Called right after a batch's records were committed to the cache
    fn on_commit(&mut self, _subtitles: &[MergedSubtitle], _cache: &TranslationCache) {}
}

/// Re-renders at a clock's position whenever a batch commits
struct LiveRender {
    sync: PlaybackSync,
    clock: Box<dyn PlaybackClock + Send>,
}

/// Observers owned by a session
#[derive(Default)]
pub struct Observers {
    subscribers: Vec<Box<dyn PipelineObserver>>,
    live: Option<LiveRender>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn PipelineObserver>) {
        self.subscribers.push(observer);
    }

    /// Render at `clock`'s position after every committed batch
    pub fn render_on_commit(&mut self, sync: PlaybackSync, clock: Box<dyn PlaybackClock + Send>) {
        self.live = Some(LiveRender { sync, clock });
    }

    /// Move every subscriber of `other` here, and its live clock if it has one
    pub fn merge(&mut self, other: Observers) {
        self.subscribers.extend(other.subscribers);
        if other.live.is_some() {
            self.live = other.live;
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn progress(&mut self, status: &ProcessingStatus) {
        for observer in &mut self.subscribers {
            observer.on_progress(status);
        }
    }

    pub fn event(&mut self, event: PipelineEvent) {
        for observer in &mut self.subscribers {
            observer.on_event(&event);
        }
    }

    pub fn render(&mut self, lines: &[RenderLine]) {
        for observer in &mut self.subscribers {
            observer.on_render(lines);
        }
    }

    pub fn commit(&mut self, subtitles: &[MergedSubtitle], cache: &TranslationCache) {
        for observer in &mut self.subscribers {
            observer.on_commit(subtitles, cache);
        }

        let lines = match &self.live {
            Some(live) => live.sync.render(live.clock.current_time_ms(), subtitles, cache),
            None => return,
        };
        self.render(&lines);
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.subscribers.len())
            .field("live", &self.live.is_some())
            .finish()
    }
}

/// Observer that records everything it receives, for tests and diagnostics
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    inner: std::sync::Arc<std::sync::Mutex<Recorded>>,
}

/// What a [`RecordingObserver`] has seen so far
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub statuses: Vec<ProcessingStatus>,
    pub events: Vec<PipelineEvent>,
    pub renders: Vec<Vec<RenderLine>>,

    /// Cache size seen at each commit
    pub commits: Vec<usize>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded notifications
    pub fn recorded(&self) -> Recorded {
        self.inner
            .lock()
            .map(|recorded| recorded.clone())
            .unwrap_or_default()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_progress(&mut self, status: &ProcessingStatus) {
        if let Ok(mut recorded) = self.inner.lock() {
            recorded.statuses.push(*status);
        }
    }

    fn on_event(&mut self, event: &PipelineEvent) {
        if let Ok(mut recorded) = self.inner.lock() {
            recorded.events.push(event.clone());
        }
    }

    fn on_render(&mut self, lines: &[RenderLine]) {
        if let Ok(mut recorded) = self.inner.lock() {
            recorded.renders.push(lines.to_vec());
        }
    }

    fn on_commit(&mut self, _subtitles: &[MergedSubtitle], cache: &TranslationCache) {
        if let Ok(mut recorded) = self.inner.lock() {
            recorded.commits.push(cache.len());
        }
    }
}
