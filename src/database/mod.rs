/*!
 * Database module for persistent storage of translations.
 *
 * This module provides SQLite-based persistence for the per-video
 * translation cache. Sessions talk to it through the [`CacheStore`] trait.
 */

use anyhow::Result;
use async_trait::async_trait;

use crate::translation::TranslationCache;

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{CacheStats, CachedVideo};
pub use repository::CacheRepository;

/// Whole-video persistence of translation caches
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the cache stored for a video, if any
    async fn load_for_video(&self, video_id: &str) -> Result<Option<TranslationCache>>;

    /// Replace the cache stored for a video
    async fn persist_for_video(&self, video_id: &str, cache: &TranslationCache) -> Result<()>;
}
