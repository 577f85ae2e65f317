/*!
 * Per-video translation cache.
 *
 * Maps the original text of each merged subtitle to its corrected and
 * translated form. Lookups try the exact text first and then fall back to a
 * normalized comparison, which absorbs the small differences (entities,
 * punctuation, casing, spacing) between a cached key and the text seen at
 * playback time.
 */

use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::captions::entities::decode_html_entities;

/// Corrected transcription and translation of one subtitle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    /// Transcription after correction
    pub corrected_text: String,

    /// Translation into the target language
    pub translation: String,
}

impl TranslationRecord {
    pub fn new(corrected_text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            corrected_text: corrected_text.into(),
            translation: translation.into(),
        }
    }
}

/// Normalize text into its fuzzy lookup key.
///
/// Entities are decoded, the text is lowercased, punctuation is dropped and
/// whitespace runs collapse to single spaces.
pub fn normalize_for_lookup(text: &str) -> String {
    let decoded = decode_html_entities(text).to_lowercase();
    let without_punctuation: String = decoded
        .chars()
        .map(|c| if is_punctuation(c) { ' ' } else { c })
        .collect();

    without_punctuation
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '，' | '。' | '！' | '？' | '、' | '；' | '：' | '…' | '「' | '」' | '『' | '』'
                | '“' | '”' | '‘' | '’' | '«' | '»' | '¿' | '¡' | '—' | '–'
        )
}

/// Translation cache for one video
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
    /// Records keyed by original subtitle text
    entries: HashMap<String, TranslationRecord>,

    /// Normalized form of every key, in insertion order, for fuzzy scans
    normalized_keys: Vec<(String, String)>,
}

impl TranslationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record, first by exact text, then by normalized text
    pub fn get(&self, text: &str) -> Option<&TranslationRecord> {
        if let Some(record) = self.entries.get(text) {
            return Some(record);
        }

        let needle = normalize_for_lookup(text);
        if needle.is_empty() {
            return None;
        }

        let found = self
            .normalized_keys
            .iter()
            .find(|(normalized, _)| *normalized == needle)
            .and_then(|(_, key)| self.entries.get(key));

        if found.is_some() {
            debug!("Fuzzy cache hit for '{}'", truncate_text(text, 30));
        }
        found
    }

    /// Insert or overwrite the record for `text`
    pub fn set(&mut self, text: impl Into<String>, record: TranslationRecord) {
        let text = text.into();
        if !self.entries.contains_key(&text) {
            self.normalized_keys.push((normalize_for_lookup(&text), text.clone()));
        }
        self.entries.insert(text, record);
    }

    /// Insert a group of records together
    pub fn extend<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = (String, TranslationRecord)>,
    {
        for (text, record) in records {
            self.set(text, record);
        }
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialized as a JSON object whose keys follow insertion order
impl Serialize for TranslationCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (_, key) in &self.normalized_keys {
            if let Some(record) = self.entries.get(key) {
                map.serialize_entry(key, record)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TranslationCache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CacheVisitor)
    }
}

struct CacheVisitor;

impl<'de> Visitor<'de> for CacheVisitor {
    type Value = TranslationCache;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of subtitle text to translation records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut cache = TranslationCache::new();
        while let Some((text, record)) = access.next_entry::<String, TranslationRecord>()? {
            cache.set(text, record);
        }
        Ok(cache)
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
