/*!
 * Session-specific models.
 */

use serde::Serialize;

use crate::translation::ProcessingStatus;

/// How a video's translations were made available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrepareOutcome {
    /// The persisted cache was loaded; the translator was not called
    CacheHit { entries: usize },

    /// Every batch succeeded and the cache was persisted
    Translated { translated: usize },

    /// A batch failed for good; earlier batches stay in memory only
    Aborted {
        processed: usize,
        total: usize,
        error: String,
    },
}

impl PrepareOutcome {
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Aborted { .. })
    }
}

/// Snapshot of a live session for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Session ID
    pub id: String,
    /// Video the session plays
    pub video_id: String,
    /// Number of merged subtitles
    pub subtitle_count: usize,
    /// Number of records in the in-memory cache
    pub cached_entries: usize,
    /// Pipeline progress
    pub status: ProcessingStatus,
}
