/*!
 * Timed-text caption track acquisition.
 *
 * Fetches a caption track over HTTP and turns its `<text start=".." dur="..">`
 * elements into ordered [`RawCue`]s.
 */

use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::entities::decode_html_entities;
use crate::errors::TrackError;

// @const: One caption element, including its raw inner content
static TEXT_ELEMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").unwrap()
});

// @const: A single attribute with single or double quotes
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

// @const: Markup tags left inside caption text (font, i, b...)
static MARKUP_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());

// @const: Any run of whitespace
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Largest start or duration accepted from a track, in seconds
const MAX_TIME_SECS: f64 = 1_000_000_000.0;

/// A single timestamped caption entry from the original track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCue {
    /// Start time in ms
    pub start_ms: u64,

    /// End time in ms, clipped to the next cue's start
    pub end_ms: u64,

    /// Caption text with entities decoded and line breaks flattened
    pub text: String,
}

impl RawCue {
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// An element as it appears in the document, before end times are resolved
#[derive(Debug)]
struct TimedEntry {
    start_ms: u64,
    duration_ms: u64,
    text: String,
}

/// Parse a timed-text XML document into ordered cues.
///
/// Each cue ends at `start + dur`, or at the next cue's start if that comes
/// first. The last cue always keeps its full duration.
pub fn parse_timed_text(xml: &str) -> Result<Vec<RawCue>, TrackError> {
    let mut entries = Vec::new();

    for caps in TEXT_ELEMENT_REGEX.captures_iter(xml) {
        let attributes = caps.get(1).map_or("", |m| m.as_str());
        let raw_text = caps.get(2).map_or("", |m| m.as_str());

        let mut start = None;
        let mut duration = None;
        for attr in ATTRIBUTE_REGEX.captures_iter(attributes) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .map_or("", |m| m.as_str());
            match &attr[1] {
                "start" => start = Some(parse_seconds(value)?),
                "dur" => duration = Some(parse_seconds(value)?),
                _ => {}
            }
        }

        let Some(start_ms) = start else {
            return Err(TrackError::Parse(
                "caption element without a start attribute".to_string(),
            ));
        };

        let text = clean_caption_text(raw_text);
        if text.is_empty() {
            debug!("Skipping empty caption at {} ms", start_ms);
            continue;
        }

        entries.push(TimedEntry {
            start_ms,
            duration_ms: duration.unwrap_or(0),
            text,
        });
    }

    if entries.is_empty() {
        return Err(TrackError::Parse("track contains no caption cues".to_string()));
    }

    entries.sort_by_key(|e| e.start_ms);

    let cues = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let natural_end = entry.start_ms.saturating_add(entry.duration_ms);
            let end_ms = match entries.get(idx + 1) {
                Some(next) => natural_end.min(next.start_ms),
                None => natural_end,
            };
            RawCue::new(entry.start_ms, end_ms, entry.text.clone())
        })
        .collect();

    Ok(cues)
}

// @param value: Fractional seconds as written in the track
// @returns: Milliseconds, rounded
fn parse_seconds(value: &str) -> Result<u64, TrackError> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| TrackError::Parse(format!("invalid time value '{}'", value)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(TrackError::Parse(format!("invalid time value '{}'", value)));
    }
    if seconds > MAX_TIME_SECS {
        return Err(TrackError::Parse(format!("time value '{}' out of range", value)));
    }

    Ok((seconds * 1000.0).round() as u64)
}

/// Decode entities, drop markup and flatten line breaks
fn clean_caption_text(raw: &str) -> String {
    let without_tags = MARKUP_TAG_REGEX.replace_all(raw, "");
    let decoded = decode_html_entities(&without_tags);
    let without_tags = MARKUP_TAG_REGEX.replace_all(&decoded, "");
    WHITESPACE_REGEX
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// HTTP client for caption tracks
#[derive(Debug, Clone)]
pub struct TrackFetcher {
    client: Client,
}

impl TrackFetcher {
    /// Create a fetcher with the given request timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Download and parse the track at `url`
    pub async fn fetch(&self, url: &str) -> Result<Vec<RawCue>, TrackError> {
        let url = Url::parse(url)
            .map_err(|e| TrackError::Request(format!("invalid track URL '{}': {}", url, e)))?;

        debug!("Fetching caption track from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TrackError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Caption track request to {} failed with {}", url, status);
            return Err(TrackError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TrackError::Request(e.to_string()))?;

        let cues = parse_timed_text(&body)?;
        debug!("Parsed {} caption cues", cues.len());
        Ok(cues)
    }
}

impl Default for TrackFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
