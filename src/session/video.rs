/*!
 * Per-video session state.
 *
 * A `VideoSession` owns everything tied to one loaded video: the merged
 * subtitles, the in-memory translation cache, the processing status and the
 * subscribed observers. Dropping the session drops all of it, together with
 * any pipeline future still borrowing it.
 */

use log::{info, warn};
use uuid::Uuid;

use crate::captions::MergedSubtitle;
use crate::database::CacheStore;
use crate::playback::{PlaybackClock, PlaybackSync, RenderLine};
use crate::providers::Translator;
use crate::translation::{
    BatchScheduler, Observers, PipelineEvent, PipelineObserver, ProcessingStatus, TranslationCache,
};

use super::models::{PrepareOutcome, SessionInfo};

/// State of one loaded video
#[derive(Debug)]
pub struct VideoSession {
    id: String,
    video_id: String,
    subtitles: Vec<MergedSubtitle>,
    cache: TranslationCache,
    status: ProcessingStatus,
    observers: Observers,
    playback: PlaybackSync,
}

impl VideoSession {
    pub fn new(video_id: impl Into<String>, subtitles: Vec<MergedSubtitle>, playback: PlaybackSync) -> Self {
        let status = ProcessingStatus {
            total: subtitles.len(),
            ..ProcessingStatus::default()
        };
        Self {
            id: Uuid::new_v4().to_string(),
            video_id: video_id.into(),
            subtitles,
            cache: TranslationCache::new(),
            status,
            observers: Observers::new(),
            playback,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn subtitles(&self) -> &[MergedSubtitle] {
        &self.subtitles
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn status(&self) -> &ProcessingStatus {
        &self.status
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            video_id: self.video_id.clone(),
            subtitle_count: self.subtitles.len(),
            cached_entries: self.cache.len(),
            status: self.status,
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn PipelineObserver>) {
        self.observers.subscribe(observer);
    }

    /// Add every observer of `observers` to this session
    pub fn subscribe_all(&mut self, observers: Observers) {
        self.observers.merge(observers);
    }

    /// Render at `clock`'s position after each committed batch while translating
    pub fn follow_clock(&mut self, clock: Box<dyn PlaybackClock + Send>) {
        self.observers.render_on_commit(self.playback.clone(), clock);
    }

    /// Make translations available for every subtitle.
    ///
    /// A stored cache for the video is used as is and no batch runs, even if
    /// it does not cover every subtitle. Otherwise the pipeline runs and, if
    /// every batch succeeds, the cache is stored. Storage failures are logged
    /// and never fail the call: a failed load counts as a miss and a failed
    /// write is dropped.
    pub async fn prepare(
        &mut self,
        scheduler: &BatchScheduler,
        translator: &dyn Translator,
        store: &dyn CacheStore,
    ) -> PrepareOutcome {
        match store.load_for_video(&self.video_id).await {
            Ok(Some(cache)) => {
                let entries = cache.len();
                info!("Loaded {} cached translations for video {}", entries, self.video_id);
                self.cache = cache;
                self.status = ProcessingStatus {
                    total: self.subtitles.len(),
                    processed: self.subtitles.len(),
                    is_processing: false,
                };
                self.observers.event(PipelineEvent::CacheHit { entries });
                self.observers.progress(&self.status);
                return PrepareOutcome::CacheHit { entries };
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load cache for video {}: {:#}", self.video_id, e),
        }

        let result = scheduler
            .run(
                &self.subtitles,
                translator,
                &mut self.cache,
                &mut self.status,
                &mut self.observers,
            )
            .await;

        match result {
            Ok(translated) => {
                if let Err(e) = store.persist_for_video(&self.video_id, &self.cache).await {
                    warn!("Failed to persist cache for video {}: {:#}", self.video_id, e);
                }
                PrepareOutcome::Translated { translated }
            }
            Err(e) => PrepareOutcome::Aborted {
                processed: self.status.processed,
                total: self.status.total,
                error: e.to_string(),
            },
        }
    }

    /// Lines to display at `time_ms`, also sent to the observers
    pub fn render(&mut self, time_ms: u64) -> Vec<RenderLine> {
        let lines = self.playback.render(time_ms, &self.subtitles, &self.cache);
        self.observers.render(&lines);
        lines
    }

    /// Lines to display at the clock's current position
    pub fn render_at(&mut self, clock: &dyn PlaybackClock) -> Vec<RenderLine> {
        self.render(clock.current_time_ms())
    }
}
