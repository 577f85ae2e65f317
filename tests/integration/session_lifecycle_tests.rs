/*!
 * Integration tests for the full video session lifecycle
 */

use wiremock::MockServer;

use bisub::database::CacheRepository;
use bisub::errors::AppError;
use bisub::playback::{FixedClock, PlaybackSync, SharedClock};
use bisub::providers::{MockReply, MockTranslator};
use bisub::session::{PrepareOutcome, SessionManager};
use bisub::translation::{Observers, PipelineEvent, RecordingObserver};

use crate::common::{FailingStore, SAMPLE_TRACK, init_test_logging, mount_track, test_config};

fn manager(translator: &MockTranslator, repository: &CacheRepository) -> SessionManager {
    init_test_logging();
    SessionManager::new(
        &test_config(),
        Box::new(translator.clone()),
        Box::new(repository.clone()),
    )
    .unwrap()
}

fn recorded_observers() -> (Observers, RecordingObserver) {
    let recorder = RecordingObserver::new();
    let mut observers = Observers::new();
    observers.subscribe(Box::new(recorder.clone()));
    (observers, recorder)
}

/// Test that a first open translates and persists, and a second open is served from storage
#[tokio::test]
async fn test_openVideo_twice_shouldSkipTranslatorOnSecondOpen() {
    let server = MockServer::start().await;
    mount_track(&server, SAMPLE_TRACK).await;
    let url = format!("{}/track", server.uri());

    let translator = MockTranslator::echo();
    let repository = CacheRepository::new_in_memory("bisub_cache_").unwrap();
    let mut sessions = manager(&translator, &repository);

    let outcome = sessions.open_video("abc123", &url, Observers::new()).await.unwrap();
    assert_eq!(outcome, PrepareOutcome::Translated { translated: 4 });
    assert_eq!(translator.call_count(), 2);

    let stored = repository.load("abc123").await.unwrap().unwrap();
    assert_eq!(stored.len(), 4);

    let (observers, recorder) = recorded_observers();
    let outcome = sessions.open_video("abc123", &url, observers).await.unwrap();
    assert_eq!(outcome, PrepareOutcome::CacheHit { entries: 4 });
    assert_eq!(translator.call_count(), 2, "a cache hit must not call the translator");

    let recorded = recorder.recorded();
    assert_eq!(recorded.events, vec![PipelineEvent::CacheHit { entries: 4 }]);
    let status = recorded.statuses.last().copied().unwrap();
    assert_eq!((status.processed, status.total), (4, 4));
}

/// Test rendering the current session at playback positions
#[tokio::test]
async fn test_render_afterTranslation_shouldShowBothLines() {
    let server = MockServer::start().await;
    mount_track(&server, SAMPLE_TRACK).await;

    let translator = MockTranslator::echo().with_prefix("[zh]");
    let repository = CacheRepository::new_in_memory("bisub_cache_").unwrap();
    let mut sessions = manager(&translator, &repository);

    let (observers, recorder) = recorded_observers();
    sessions
        .open_video("abc123", &format!("{}/track", server.uri()), observers)
        .await
        .unwrap();

    let lines = sessions.render(&FixedClock(21.0)).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].original, "today we're talking about the weather");
    assert_eq!(lines[0].translation, "[zh] today we're talking about the weather");
    assert!(lines[0].translated);

    assert!(sessions.render(&FixedClock(10.0)).unwrap().is_empty());
    assert_eq!(recorder.recorded().renders.len(), 2);
}

/// Test that a track failure leaves no session and never calls the translator
#[tokio::test]
async fn test_openVideo_withMissingTrack_shouldFailWithoutSession() {
    let server = MockServer::start().await;

    let translator = MockTranslator::echo();
    let repository = CacheRepository::new_in_memory("bisub_cache_").unwrap();
    let mut sessions = manager(&translator, &repository);

    let result = sessions
        .open_video("abc123", &format!("{}/track", server.uri()), Observers::new())
        .await;

    assert!(matches!(result, Err(AppError::Track(_))));
    assert!(sessions.current().is_none());
    assert!(sessions.render(&FixedClock(1.0)).is_none());
    assert_eq!(translator.call_count(), 0);
}

/// Test that storage failures never fail a session
#[tokio::test]
async fn test_openVideo_withFailingStore_shouldStillTranslate() {
    let server = MockServer::start().await;
    mount_track(&server, SAMPLE_TRACK).await;

    init_test_logging();
    let translator = MockTranslator::echo();
    let mut sessions = SessionManager::new(
        &test_config(),
        Box::new(translator.clone()),
        Box::new(FailingStore),
    )
    .unwrap();

    let outcome = sessions
        .open_video("abc123", &format!("{}/track", server.uri()), Observers::new())
        .await
        .unwrap();

    assert_eq!(outcome, PrepareOutcome::Translated { translated: 4 });
    assert_eq!(sessions.current().map(|s| s.cache().len()), Some(4));
}

/// Test that an aborted run keeps earlier batches in memory but persists nothing
#[tokio::test]
async fn test_openVideo_withAbortedRun_shouldNotPersist() {
    let server = MockServer::start().await;
    mount_track(&server, SAMPLE_TRACK).await;
    let url = format!("{}/track", server.uri());

    let translator = MockTranslator::scripted([
        MockReply::Echo,
        MockReply::Absent,
    ]);
    let repository = CacheRepository::new_in_memory("bisub_cache_").unwrap();
    let mut sessions = manager(&translator, &repository);

    let outcome = sessions.open_video("abc123", &url, Observers::new()).await.unwrap();

    match outcome {
        PrepareOutcome::Aborted { processed, total, .. } => assert_eq!((processed, total), (2, 4)),
        other => panic!("expected an aborted run, got {:?}", other),
    }
    assert_eq!(sessions.current().map(|s| s.cache().len()), Some(2));
    assert!(repository.load("abc123").await.unwrap().is_none());

    // The next open translates again from scratch
    let outcome = sessions.open_video("abc123", &url, Observers::new()).await.unwrap();
    assert_eq!(outcome, PrepareOutcome::Translated { translated: 4 });
}

/// Test that opening another video replaces the live session
#[tokio::test]
async fn test_openVideoWithCues_forSecondVideo_shouldReplaceSession() {
    let cues = bisub::captions::parse_timed_text(SAMPLE_TRACK).unwrap();
    let translator = MockTranslator::echo();
    let repository = CacheRepository::new_in_memory("bisub_cache_").unwrap();
    let mut sessions = manager(&translator, &repository);

    sessions.open_video_with_cues("first", &cues, Observers::new()).await;
    let first_id = sessions.current().map(|s| s.id().to_string()).unwrap();

    sessions.open_video_with_cues("second", &cues[..3], Observers::new()).await;
    let current = sessions.current().unwrap();

    assert_ne!(current.id(), first_id);
    assert_eq!(current.video_id(), "second");
    assert_eq!(current.subtitles().len(), 1);

    sessions.close();
    assert!(sessions.current().is_none());

    let videos = repository.list_videos().await.unwrap();
    assert_eq!(videos.len(), 2);
}

/// Test that the cache survives reopening the database file
#[tokio::test]
async fn test_persistedCache_afterReopeningDatabase_shouldBeServed() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.db");
    let cues = bisub::captions::parse_timed_text(SAMPLE_TRACK).unwrap();

    let translator = MockTranslator::echo();
    {
        let repository = CacheRepository::open(Some(&db_path), "bisub_cache_").unwrap();
        let mut sessions = manager(&translator, &repository);
        sessions.open_video_with_cues("abc123", &cues, Observers::new()).await;
    }

    let repository = CacheRepository::open(Some(&db_path), "bisub_cache_").unwrap();
    let mut sessions = manager(&translator, &repository);
    let outcome = sessions.open_video_with_cues("abc123", &cues, Observers::new()).await;

    assert_eq!(outcome, PrepareOutcome::CacheHit { entries: 4 });
    assert_eq!(translator.call_count(), 2);

    let stats = repository.stats().await.unwrap();
    assert_eq!(stats.video_count, 1);
    assert_eq!(stats.entry_count, 4);
}

/// Test that an observer following the playback clock sees each batch land
#[tokio::test]
async fn test_openVideo_withFollowedClock_shouldShowPendingUntilBatchCommits() {
    let server = MockServer::start().await;
    mount_track(&server, SAMPLE_TRACK).await;

    let translator = MockTranslator::echo().with_prefix("[zh]");
    let repository = CacheRepository::new_in_memory("bisub_cache_").unwrap();
    let mut sessions = manager(&translator, &repository);

    let (mut observers, recorder) = recorded_observers();
    let clock = SharedClock::new(41.0);
    observers.render_on_commit(PlaybackSync::new(&test_config().playback), Box::new(clock.clone()));

    sessions
        .open_video("abc123", &format!("{}/track", server.uri()), observers)
        .await
        .unwrap();

    let renders = recorder.recorded().renders;
    assert_eq!(renders.len(), 2);
    assert_eq!(renders[0][0].original, "it's going to rain");
    assert_eq!(renders[0][0].translation, "Translating...");
    assert!(!renders[0][0].translated);
    assert_eq!(renders[1][0].translation, "[zh] it's going to rain");
}
