/*!
 * Regrouping of raw cues into display-sized subtitles.
 *
 * Timed-text tracks often split one sentence across several short cues. The
 * merger coalesces consecutive cues into a single on-screen unit as long as
 * the group stays close in time, short enough in duration, and short enough
 * in text.
 */

use serde::{Deserialize, Serialize};

use super::track::RawCue;
use crate::app_config::MergeConfig;

/// A coalesced run of cues presented as one caption unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedSubtitle {
    /// Start of the first absorbed cue, in ms
    pub start_ms: u64,

    /// End of the last absorbed cue, in ms
    pub end_ms: u64,

    /// Space-joined text of the absorbed cues
    pub text: String,
}

impl MergedSubtitle {
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Whether `time_ms` falls inside `[start_ms, end_ms)`
    pub fn is_active_at(&self, time_ms: u64) -> bool {
        self.start_ms <= time_ms && time_ms < self.end_ms
    }

    fn from_cue(cue: &RawCue) -> Self {
        Self::new(cue.start_ms, cue.end_ms, cue.text.clone())
    }
}

/// Greedy left-to-right cue merger
#[derive(Debug, Clone)]
pub struct SegmentMerger {
    max_gap_ms: u64,
    max_group_duration_ms: u64,
    max_text_length: usize,
}

impl SegmentMerger {
    /// Create a merger from the configured thresholds
    pub fn new(config: &MergeConfig) -> Self {
        Self {
            max_gap_ms: config.max_gap_ms,
            max_group_duration_ms: config.max_group_duration_ms,
            max_text_length: config.max_text_length,
        }
    }

    /// Merge `cues` into display groups.
    ///
    /// A cue joins the current group only if the gap since the group's end,
    /// the resulting group duration and the resulting text length all stay
    /// within their limits. A single cue longer than the text limit still
    /// forms its own group; cues are never split.
    pub fn merge(&self, cues: &[RawCue]) -> Vec<MergedSubtitle> {
        let mut merged = Vec::new();
        let mut iter = cues.iter();

        let Some(first) = iter.next() else {
            return merged;
        };

        let mut current = MergedSubtitle::from_cue(first);
        let mut current_len = current.text.chars().count();

        for next in iter {
            let gap = next.start_ms.saturating_sub(current.end_ms);
            let would_be_duration = next.end_ms.saturating_sub(current.start_ms);
            let would_be_len = current_len + 1 + next.text.chars().count();

            if gap <= self.max_gap_ms
                && would_be_duration <= self.max_group_duration_ms
                && would_be_len <= self.max_text_length
            {
                current.text.push(' ');
                current.text.push_str(&next.text);
                current.end_ms = next.end_ms;
                current_len = would_be_len;
            } else {
                merged.push(std::mem::replace(&mut current, MergedSubtitle::from_cue(next)));
                current_len = current.text.chars().count();
            }
        }

        merged.push(current);
        merged
    }
}

impl Default for SegmentMerger {
    fn default() -> Self {
        Self::new(&MergeConfig::default())
    }
}
