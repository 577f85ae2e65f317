/*!
 * Repository layer for the persisted translation cache.
 *
 * Each video's translation map is stored as a single JSON document keyed by
 * `{prefix}{video_id}`. Writes replace the whole document inside one
 * transaction, so readers see either the previous map or the new one.
 */

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rusqlite::{OptionalExtension, params};

use super::CacheStore;
use super::connection::DatabaseConnection;
use super::models::{CacheStats, CachedVideo};
use crate::translation::{TranslationCache, TranslationRecord};

/// Repository for the per-video translation cache
#[derive(Debug, Clone)]
pub struct CacheRepository {
    /// Database connection
    db: DatabaseConnection,
    /// Prefix of every cache key
    key_prefix: String,
}

impl CacheRepository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            db,
            key_prefix: key_prefix.into(),
        }
    }

    /// Open the database at `path`, or at the default location
    pub fn open(path: Option<&Path>, key_prefix: impl Into<String>) -> Result<Self> {
        let db = match path {
            Some(path) => DatabaseConnection::new(path)?,
            None => DatabaseConnection::new_default()?,
        };
        Ok(Self::new(db, key_prefix))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory(key_prefix: impl Into<String>) -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db, key_prefix))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Storage key for a video
    pub fn cache_key(&self, video_id: &str) -> String {
        format!("{}{}", self.key_prefix, video_id)
    }

    /// Load the stored map of a video
    pub async fn load(&self, video_id: &str) -> Result<Option<HashMap<String, TranslationRecord>>> {
        self.load_payload(video_id)
            .await?
            .map(|payload| {
                serde_json::from_str(&payload)
                    .with_context(|| format!("Corrupt cache payload for video {}", video_id))
            })
            .transpose()
    }

    /// Load the stored cache of a video, keeping the stored key order
    pub async fn load_cache(&self, video_id: &str) -> Result<Option<TranslationCache>> {
        self.load_payload(video_id)
            .await?
            .map(|payload| {
                serde_json::from_str(&payload)
                    .with_context(|| format!("Corrupt cache payload for video {}", video_id))
            })
            .transpose()
    }

    async fn load_payload(&self, video_id: &str) -> Result<Option<String>> {
        let key = self.cache_key(video_id);

        self.db
            .execute_async(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT payload FROM video_cache WHERE cache_key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await
    }

    /// Replace the stored map of a video
    pub async fn persist(&self, video_id: &str, records: &HashMap<String, TranslationRecord>) -> Result<()> {
        let payload = serde_json::to_string(records).context("Failed to serialize cache")?;
        self.persist_payload(video_id, payload, records.len()).await
    }

    /// Replace the stored cache of a video, keeping its insertion order
    pub async fn persist_cache(&self, video_id: &str, cache: &TranslationCache) -> Result<()> {
        let payload = serde_json::to_string(cache).context("Failed to serialize cache")?;
        self.persist_payload(video_id, payload, cache.len()).await
    }

    async fn persist_payload(&self, video_id: &str, payload: String, entry_count: usize) -> Result<()> {
        let key = self.cache_key(video_id);
        let video_id = video_id.to_string();
        let entry_count = entry_count as i64;
        let now = Utc::now().to_rfc3339();

        self.db
            .transaction_async(move |tx| {
                let created_at: Option<String> = tx
                    .query_row(
                        "SELECT created_at FROM video_cache WHERE cache_key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?;

                tx.execute(
                    r#"
                    INSERT OR REPLACE INTO video_cache (
                        cache_key, video_id, payload, entry_count, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        key,
                        video_id,
                        payload,
                        entry_count,
                        created_at.unwrap_or_else(|| now.clone()),
                        now
                    ],
                )?;
                Ok(())
            })
            .await?;

        debug!("Persisted {} cache entries", entry_count);
        Ok(())
    }

    /// Delete the stored map of a video; returns whether one existed
    pub async fn delete_video(&self, video_id: &str) -> Result<bool> {
        let key = self.cache_key(video_id);
        let deleted = self
            .db
            .execute_async(move |conn| {
                Ok(conn.execute("DELETE FROM video_cache WHERE cache_key = ?1", params![key])?)
            })
            .await?;
        Ok(deleted > 0)
    }

    /// Delete every stored map under this prefix; returns how many were removed
    pub async fn clear(&self) -> Result<usize> {
        let pattern = like_prefix(&self.key_prefix);
        self.db
            .execute_async(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM video_cache WHERE cache_key LIKE ?1 ESCAPE '\\'",
                    params![pattern],
                )?)
            })
            .await
    }

    /// Cached videos under this prefix, most recently updated first
    pub async fn list_videos(&self) -> Result<Vec<CachedVideo>> {
        let pattern = like_prefix(&self.key_prefix);
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT video_id, entry_count, updated_at FROM video_cache
                    WHERE cache_key LIKE ?1 ESCAPE '\'
                    ORDER BY updated_at DESC, video_id
                    "#,
                )?;
                let videos = stmt
                    .query_map(params![pattern], |row| {
                        Ok(CachedVideo {
                            video_id: row.get(0)?,
                            entry_count: row.get(1)?,
                            updated_at: row.get(2)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(videos)
            })
            .await
    }

    /// Counts of cached videos and subtitles under this prefix
    pub async fn stats(&self) -> Result<CacheStats> {
        let pattern = like_prefix(&self.key_prefix);
        let (video_count, entry_count) = self
            .db
            .execute_async(move |conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(entry_count), 0) FROM video_cache WHERE cache_key LIKE ?1 ESCAPE '\\'",
                    params![pattern],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                )?)
            })
            .await?;

        Ok(CacheStats {
            video_count,
            entry_count,
            file_size_bytes: self.db.file_size(),
        })
    }
}

#[async_trait]
impl CacheStore for CacheRepository {
    async fn load_for_video(&self, video_id: &str) -> Result<Option<TranslationCache>> {
        self.load_cache(video_id).await
    }

    async fn persist_for_video(&self, video_id: &str, cache: &TranslationCache) -> Result<()> {
        self.persist_cache(video_id, cache).await
    }
}

/// LIKE pattern matching every key that starts with `prefix`
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
