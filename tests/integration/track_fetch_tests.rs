/*!
 * Integration tests for caption track download
 */

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bisub::captions::TrackFetcher;
use bisub::errors::TrackError;

use crate::common::{SAMPLE_TRACK, mount_track};

/// Test downloading and parsing a served track
#[tokio::test]
async fn test_fetch_withServedTrack_shouldReturnCues() {
    let server = MockServer::start().await;
    mount_track(&server, SAMPLE_TRACK).await;

    let cues = TrackFetcher::default()
        .fetch(&format!("{}/track", server.uri()))
        .await
        .unwrap();

    assert_eq!(cues.len(), 8);
    assert_eq!(cues[0].text, "hi");
    assert_eq!(cues[7].end_ms, 65_000);
}

/// Test that an HTTP error status is surfaced with its code
#[tokio::test]
async fn test_fetch_withNotFound_shouldReturnStatusError() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/track"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = TrackFetcher::default()
        .fetch(&format!("{}/track", server.uri()))
        .await;

    assert!(matches!(result, Err(TrackError::Status(404))));
}

/// Test that a body without cues is a parse failure
#[tokio::test]
async fn test_fetch_withEmptyTranscript_shouldReturnParseError() {
    let server = MockServer::start().await;
    mount_track(&server, "<transcript></transcript>").await;

    let result = TrackFetcher::default()
        .fetch(&format!("{}/track", server.uri()))
        .await;

    assert!(matches!(result, Err(TrackError::Parse(_))));
}

/// Test that a malformed URL never reaches the network
#[tokio::test]
async fn test_fetch_withInvalidUrl_shouldReturnRequestError() {
    let result = TrackFetcher::default().fetch("not a url").await;

    assert!(matches!(result, Err(TrackError::Request(_))));
}

/// Test that a slow server trips the request timeout
#[tokio::test]
async fn test_fetch_withSlowServer_shouldTimeOut() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/track"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(SAMPLE_TRACK)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let result = TrackFetcher::new(Duration::from_millis(50))
        .fetch(&format!("{}/track", server.uri()))
        .await;

    assert!(matches!(result, Err(TrackError::Request(_))));
}
