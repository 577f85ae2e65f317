/*!
 * Common test utilities for the bisub test suite
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bisub::app_config::{Config, TranslationCommonConfig};
use bisub::captions::MergedSubtitle;
use bisub::database::CacheStore;
use bisub::translation::{BatchScheduler, TranslationCache, TranslationRequestBuilder};

/// Timed-text track with eight short cues in two clusters
pub const SAMPLE_TRACK: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0" dur="1.5">hi</text>
<text start="1.5" dur="1.0">there</text>
<text start="2.5" dur="2.0">welcome back to the channel</text>
<text start="20" dur="2.5">today we&amp;#39;re talking about</text>
<text start="22.5" dur="2.0">the weather</text>
<text start="40" dur="3.0">it&#39;s going to rain</text>
<text start="60" dur="3.0">see you</text>
<text start="63" dur="2.0">next time</text>
</transcript>"#;

/// Send library logs to the test output; `RUST_LOG` selects the level
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration with zero delays, for fast tests
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.common = TranslationCommonConfig {
        batch_size: 2,
        inter_batch_delay_ms: 0,
        retry_count: 2,
        retry_backoff_ms: 0,
        ..TranslationCommonConfig::default()
    };
    config
}

/// Scheduler built from [`test_config`]
pub fn test_scheduler() -> BatchScheduler {
    let config = test_config();
    BatchScheduler::new(
        TranslationRequestBuilder::new("English", "Chinese", "zh"),
        &config.translation.common,
    )
}

/// `count` subtitles one second apart with texts `line 0`, `line 1`, ...
pub fn numbered_subtitles(count: usize) -> Vec<MergedSubtitle> {
    (0..count)
        .map(|i| {
            let start = i as u64 * 1000;
            MergedSubtitle::new(start, start + 900, format!("line {}", i))
        })
        .collect()
}

/// Serve `body` as the caption track at `/track`
pub async fn mount_track(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/track"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Store whose every operation fails
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn load_for_video(&self, _video_id: &str) -> Result<Option<TranslationCache>> {
        Err(anyhow!("disk unavailable"))
    }

    async fn persist_for_video(&self, _video_id: &str, _cache: &TranslationCache) -> Result<()> {
        Err(anyhow!("disk unavailable"))
    }
}
