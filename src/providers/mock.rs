/*!
 * Mock translator for testing.
 *
 * Replies are taken from a script, in order. Once the script is used up the
 * mock falls back to echo mode: it reads the batch embedded in the prompt and
 * answers with a well-formed reply that tags each text with a prefix.
 * - `MockTranslator::echo()` - Always answers correctly
 * - `MockTranslator::scripted(..)` - Plays the given replies first
 * - `MockTranslator::failing()` - Always fails with a connection error
 */

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::errors::ProviderError;
use crate::providers::Translator;

/// Marker that precedes the embedded batch in a prompt
const SUBTITLES_MARKER: &str = "## Subtitles";

/// One scripted reply
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Reply with this text
    Text(String),
    /// Reply without any text
    Absent,
    /// Fail with a connection error
    Fail(String),
    /// Reply correctly to the prompt, as in echo mode
    Echo,
}

/// What happens once the script is exhausted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Answer every prompt correctly
    Echo,
    /// Fail every prompt
    Failing,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockReply>,
    prompts: Vec<String>,
}

/// Scripted translator; clones share their state
#[derive(Debug, Clone)]
pub struct MockTranslator {
    /// Behavior after the script
    behavior: MockBehavior,
    /// Prefix put in front of echoed translations
    prefix: String,
    /// Script and received prompts
    state: Arc<Mutex<MockState>>,
    /// Number of `translate` calls
    calls: Arc<AtomicUsize>,
    /// Number of `cleanup` calls
    cleanups: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            prefix: "[translated]".to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
            calls: Arc::new(AtomicUsize::new(0)),
            cleanups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that always answers correctly
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a mock that always fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that plays `replies` first, then echoes
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mock = Self::echo();
        if let Ok(mut state) = mock.state.lock() {
            state.script.extend(replies);
        }
        mock
    }

    /// Set the prefix used in echoed translations
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Number of `translate` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `cleanup` calls so far
    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.prompts.clone())
            .unwrap_or_default()
    }

    /// Build a correct reply for a prompt
    pub fn echo_reply(&self, prompt: &str) -> Option<String> {
        let start = prompt.find(SUBTITLES_MARKER)? + SUBTITLES_MARKER.len();
        let items: Vec<Value> = serde_json::from_str(prompt[start..].trim()).ok()?;

        let entries: Vec<Value> = items
            .iter()
            .map(|item| {
                let text = item["text"].as_str().unwrap_or_default();
                json!({
                    "startTime": item["startTime"],
                    "endTime": item["endTime"],
                    "correctedText": text,
                    "translation": format!("{} {}", self.prefix, text),
                })
            })
            .collect();

        let body = serde_json::to_string_pretty(&entries).ok()?;
        Some(format!("Here are the results:\n```json\n{}\n```", body))
    }

    fn next_reply(&self, prompt: &str) -> MockReply {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.prompts.push(prompt.to_string());
        match state.script.pop_front() {
            Some(reply) => reply,
            None => match self.behavior {
                MockBehavior::Echo => MockReply::Echo,
                MockBehavior::Failing => MockReply::Fail("simulated failure".to_string()),
            },
        }
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::echo()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.next_reply(prompt) {
            MockReply::Text(text) => Ok(Some(text)),
            MockReply::Absent => Ok(None),
            MockReply::Fail(message) => Err(ProviderError::ConnectionError(message)),
            MockReply::Echo => self
                .echo_reply(prompt)
                .map(Some)
                .ok_or_else(|| ProviderError::ParseError("prompt carries no batch".to_string())),
        }
    }

    async fn cleanup(&self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}
