/*!
 * Database entity models.
 */

use serde::Serialize;
use std::fmt;

/// Summary of one cached video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedVideo {
    /// Video id the cache belongs to
    pub video_id: String,
    /// Number of translated subtitles in the cache
    pub entry_count: i64,
    /// Time of the last write, RFC 3339
    pub updated_at: String,
}

/// Database statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cached videos
    pub video_count: i64,
    /// Total number of cached subtitles across all videos
    pub entry_count: i64,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Videos: {}, Cached subtitles: {}, Size: {} KB",
            self.video_count,
            self.entry_count,
            self.file_size_bytes / 1024
        )
    }
}
