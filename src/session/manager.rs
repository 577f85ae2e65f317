/*!
 * Session manager for the video session lifecycle.
 *
 * This module handles:
 * - Tearing down the previous video before a new one starts
 * - Fetching and merging the caption track
 * - Preparing translations through the cache store and the translator
 * - Rendering the lines for the current playback position
 */

use anyhow::{Context, Result};
use log::{debug, info};

use crate::app_config::Config;
use crate::captions::{RawCue, SegmentMerger, TrackFetcher};
use crate::database::CacheStore;
use crate::errors::AppError;
use crate::language_utils::get_language_name;
use crate::playback::{PlaybackClock, PlaybackSync, RenderLine};
use crate::providers::Translator;
use crate::translation::{BatchScheduler, Observers, TranslationRequestBuilder};

use super::models::PrepareOutcome;
use super::video::VideoSession;

/// Owns the collaborators and at most one live video session
pub struct SessionManager {
    /// Backend used for every batch
    translator: Box<dyn Translator>,
    /// Persisted per-video caches
    store: Box<dyn CacheStore>,
    fetcher: TrackFetcher,
    merger: SegmentMerger,
    scheduler: BatchScheduler,
    playback: PlaybackSync,
    /// The live session, if any
    current: Option<VideoSession>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("translator", &self.translator.name())
            .field("current", &self.current.as_ref().map(VideoSession::id))
            .finish()
    }
}

impl SessionManager {
    /// Create a session manager from the configuration
    pub fn new(config: &Config, translator: Box<dyn Translator>, store: Box<dyn CacheStore>) -> Result<Self> {
        let source_name = get_language_name(&config.source_language)
            .context("Invalid source language")?;
        let target_name = get_language_name(&config.target_language)
            .context("Invalid target language")?;

        let builder = TranslationRequestBuilder::new(&source_name, &target_name, &config.target_language);

        Ok(Self {
            translator,
            store,
            fetcher: TrackFetcher::default(),
            merger: SegmentMerger::new(&config.merge),
            scheduler: BatchScheduler::new(builder, &config.translation.common),
            playback: PlaybackSync::new(&config.playback),
            current: None,
        })
    }

    /// Replace the caption track fetcher
    pub fn with_fetcher(mut self, fetcher: TrackFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// The live session, if any
    pub fn current(&self) -> Option<&VideoSession> {
        self.current.as_ref()
    }

    /// Tear down the previous session, fetch the track and prepare translations.
    ///
    /// A track failure is fatal for the video: no session is left open and
    /// the pipeline never starts.
    pub async fn open_video(
        &mut self,
        video_id: &str,
        track_url: &str,
        observers: Observers,
    ) -> Result<PrepareOutcome, AppError> {
        self.close();

        let cues = self.fetcher.fetch(track_url).await?;
        Ok(self.open_video_with_cues(video_id, &cues, observers).await)
    }

    /// Tear down the previous session and prepare translations for pre-fetched cues
    pub async fn open_video_with_cues(
        &mut self,
        video_id: &str,
        cues: &[RawCue],
        observers: Observers,
    ) -> PrepareOutcome {
        self.close();

        let subtitles = self.merger.merge(cues);
        debug!("Merged {} cues into {} subtitles", cues.len(), subtitles.len());

        let mut session = VideoSession::new(video_id, subtitles, self.playback.clone());
        session.subscribe_all(observers);
        info!("Opened session {} for video {}", &session.id()[..8], video_id);

        let session = self.current.insert(session);
        session
            .prepare(&self.scheduler, self.translator.as_ref(), self.store.as_ref())
            .await
    }

    /// Drop the live session, if any
    pub fn close(&mut self) {
        if let Some(session) = self.current.take() {
            info!("Closed session {} for video {}", &session.id()[..8], session.video_id());
        }
    }

    /// Lines to display at the clock's position, or `None` without a session
    pub fn render(&mut self, clock: &dyn PlaybackClock) -> Option<Vec<RenderLine>> {
        self.current.as_mut().map(|session| session.render_at(clock))
    }
}
