/*!
 * Playback synchronization.
 *
 * Given the current playback time, selects the merged subtitles on screen
 * and resolves each one through the translation cache. Selection is a pure
 * function of the time, the subtitle list and the cache.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::app_config::PlaybackConfig;
use crate::captions::MergedSubtitle;
use crate::translation::TranslationCache;

/// Source of the current playback position
pub trait PlaybackClock {
    /// Current playback time in fractional seconds
    fn current_time_secs(&self) -> f64;

    /// Current playback time in whole milliseconds, clamped at zero
    fn current_time_ms(&self) -> u64 {
        secs_to_ms(self.current_time_secs())
    }
}

/// Clock pinned to a fixed position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl PlaybackClock for FixedClock {
    fn current_time_secs(&self) -> f64 {
        self.0
    }
}

/// Clock whose position can be moved from another task while a run is in progress
#[derive(Debug, Clone, Default)]
pub struct SharedClock {
    secs_bits: Arc<AtomicU64>,
}

impl SharedClock {
    pub fn new(secs: f64) -> Self {
        let clock = Self::default();
        clock.seek(secs);
        clock
    }

    pub fn seek(&self, secs: f64) {
        self.secs_bits.store(secs.to_bits(), Ordering::Relaxed);
    }
}

impl PlaybackClock for SharedClock {
    fn current_time_secs(&self) -> f64 {
        f64::from_bits(self.secs_bits.load(Ordering::Relaxed))
    }
}

/// Convert fractional seconds to milliseconds, truncating; negative and NaN become zero
pub fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        // Absorb binary representation error (1.001 s is 1000.999... ms)
        (secs * 1000.0 + 1e-6).floor() as u64
    } else {
        0
    }
}

/// One bilingual line pair ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderLine {
    pub start_ms: u64,
    pub end_ms: u64,

    /// Corrected transcription, or the original text when not translated yet
    pub original: String,

    /// Translation, or the pending placeholder
    pub translation: String,

    /// Whether the cache had a record for this subtitle
    pub translated: bool,
}

/// Selects and resolves the subtitles active at a playback time
#[derive(Debug, Clone)]
pub struct PlaybackSync {
    max_subtitles: usize,
    pending_placeholder: String,
}

impl PlaybackSync {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            max_subtitles: config.max_subtitles.max(1),
            pending_placeholder: config.pending_placeholder.clone(),
        }
    }

    /// Subtitles with `start <= time_ms < end`, keeping the most recent
    /// `max_subtitles` in list order
    pub fn active<'a>(&self, time_ms: u64, subtitles: &'a [MergedSubtitle]) -> Vec<&'a MergedSubtitle> {
        let active: Vec<&MergedSubtitle> = subtitles
            .iter()
            .filter(|subtitle| subtitle.is_active_at(time_ms))
            .collect();

        let skip = active.len().saturating_sub(self.max_subtitles);
        active.into_iter().skip(skip).collect()
    }

    /// Lines to display at `time_ms`
    pub fn render(&self, time_ms: u64, subtitles: &[MergedSubtitle], cache: &TranslationCache) -> Vec<RenderLine> {
        self.active(time_ms, subtitles)
            .into_iter()
            .map(|subtitle| match cache.get(&subtitle.text) {
                Some(record) => RenderLine {
                    start_ms: subtitle.start_ms,
                    end_ms: subtitle.end_ms,
                    original: non_blank_or(&record.corrected_text, &subtitle.text),
                    translation: non_blank_or(&record.translation, &self.pending_placeholder),
                    translated: true,
                },
                None => RenderLine {
                    start_ms: subtitle.start_ms,
                    end_ms: subtitle.end_ms,
                    original: subtitle.text.clone(),
                    translation: self.pending_placeholder.clone(),
                    translated: false,
                },
            })
            .collect()
    }

    /// Lines to display at the clock's current position
    pub fn render_at(
        &self,
        clock: &dyn PlaybackClock,
        subtitles: &[MergedSubtitle],
        cache: &TranslationCache,
    ) -> Vec<RenderLine> {
        self.render(clock.current_time_ms(), subtitles, cache)
    }
}

impl Default for PlaybackSync {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
