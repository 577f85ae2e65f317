/*!
 * Extraction of structured results from free-form translator replies.
 *
 * Completion backends wrap the requested JSON in prose, code fences or both.
 * The extractor consumes exactly one block: the first fenced block or bare
 * array literal that appears in the reply. Later blocks are ignored, since a
 * model that echoes the worked example from the prompt would otherwise
 * inject entries that belong to no subtitle.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ExtractionError;

// @const: Start of an array of objects embedded in prose
static BARE_ARRAY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*\{").unwrap());

// @const: Comma directly before a closing bracket or brace
static TRAILING_COMMA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[\]\}])").unwrap());

const FENCE: &str = "```";

/// One item of a translator reply, matched to its subtitle by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntry {
    /// Echoed start time, not used for matching
    #[serde(default)]
    pub start_time: Value,

    /// Echoed end time, not used for matching
    #[serde(default)]
    pub end_time: Value,

    /// Corrected transcription, when the model supplied one
    #[serde(default)]
    pub corrected_text: Option<String>,

    /// Translation of the subtitle
    pub translation: String,
}

/// Where the first structured block was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Fenced,
    BareArray,
}

/// Pulls the result array out of a translator reply
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseExtractor;

impl ResponseExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract exactly `expected` entries from `response`.
    ///
    /// A single object is accepted as a one-element array. Any other count
    /// is an error: entries are matched to subtitles by position, so a short
    /// or long reply cannot be aligned safely.
    pub fn extract(&self, response: &str, expected: usize) -> Result<Vec<ExtractedEntry>, ExtractionError> {
        let block = self.first_block(response).ok_or(ExtractionError::NoStructuredData)?;
        let value = self.parse_block(block)?;

        let items = match value {
            Value::Array(items) => items,
            object @ Value::Object(_) => vec![object],
            other => {
                return Err(ExtractionError::UnexpectedShape(format!(
                    "expected an array or object, found {}",
                    json_type_name(&other)
                )));
            }
        };

        if items.len() != expected {
            warn!(
                "Translator returned {} items for a batch of {}",
                items.len(),
                expected
            );
            return Err(ExtractionError::LengthMismatch {
                expected,
                actual: items.len(),
            });
        }

        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let mut entry: ExtractedEntry = serde_json::from_value(item)
                    .map_err(|e| ExtractionError::UnexpectedShape(format!("item {}: {}", idx, e)))?;
                entry.translation = flatten_line_breaks(&entry.translation);
                entry.corrected_text = entry.corrected_text.as_deref().map(flatten_line_breaks);
                Ok(entry)
            })
            .collect()
    }

    /// Locate the first fenced block or bare array literal in the text
    fn first_block<'a>(&self, response: &'a str) -> Option<&'a str> {
        let fence = response.find(FENCE).map(|pos| (pos, BlockKind::Fenced));
        let array = BARE_ARRAY_REGEX
            .find(response)
            .map(|m| (m.start(), BlockKind::BareArray));

        let (start, kind) = match (fence, array) {
            (Some(f), Some(a)) => {
                if f.0 <= a.0 {
                    f
                } else {
                    a
                }
            }
            (Some(f), None) => f,
            (None, Some(a)) => a,
            (None, None) => return None,
        };

        debug!("Found {:?} block at offset {}", kind, start);

        match kind {
            BlockKind::Fenced => Some(fenced_body(&response[start + FENCE.len()..])),
            BlockKind::BareArray => Some(balanced_array(&response[start..])),
        }
    }

    /// Parse a block, tolerating trailing commas as a last resort
    fn parse_block(&self, block: &str) -> Result<Value, ExtractionError> {
        let trimmed = block.trim();
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Ok(value),
            Err(first_error) => {
                let repaired = TRAILING_COMMA_REGEX.replace_all(trimmed, "$1");
                if repaired != trimmed {
                    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                        debug!("Parsed response after removing trailing commas");
                        return Ok(value);
                    }
                }
                Err(ExtractionError::InvalidJson(first_error.to_string()))
            }
        }
    }
}

/// Body of a fence, without its language label and closing fence
fn fenced_body(after_fence: &str) -> &str {
    let opening = after_fence.trim_start_matches([' ', '\t']);
    let label_len = opening
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(opening.len());

    // A label starts with a letter and may share its line with the body
    let body = if opening.starts_with(|c: char| c.is_ascii_alphabetic()) {
        &opening[label_len..]
    } else {
        opening
    };

    match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}

/// Slice from an opening `[` to its matching `]`, ignoring brackets in strings
fn balanced_array(text: &str) -> &str {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[..=idx];
                }
            }
            _ => {}
        }
    }

    text
}

fn flatten_line_breaks(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
