/*!
 * Tests for caption track parsing and cue merging
 */

use bisub::app_config::MergeConfig;
use bisub::captions::{MergedSubtitle, RawCue, SegmentMerger, parse_timed_text};
use bisub::errors::TrackError;

use crate::common::SAMPLE_TRACK;

/// Test that the sample track decodes entities and resolves end times
#[test]
fn test_parseTimedText_withSampleTrack_shouldDecodeAndOrderCues() {
    let cues = parse_timed_text(SAMPLE_TRACK).unwrap();

    assert_eq!(cues.len(), 8);
    assert_eq!(cues[0], RawCue::new(0, 1500, "hi"));
    assert_eq!(cues[3].text, "today we're talking about");
    assert_eq!(cues[5].text, "it's going to rain");
    assert!(cues.windows(2).all(|w| w[0].start_ms <= w[1].start_ms));
    assert!(cues.windows(2).all(|w| w[0].end_ms <= w[1].start_ms));
}

/// Test that unordered elements are sorted by start time
#[test]
fn test_parseTimedText_withUnorderedElements_shouldSortByStart() {
    let xml = r#"<transcript>
<text start="5" dur="1">second</text>
<text start="1" dur="1">first</text>
</transcript>"#;

    let cues = parse_timed_text(xml).unwrap();

    assert_eq!(cues[0].text, "first");
    assert_eq!(cues[1].text, "second");
}

/// Test that documents without cues are rejected
#[test]
fn test_parseTimedText_withNoCues_shouldFail() {
    let result = parse_timed_text("<transcript></transcript>");
    assert!(matches!(result, Err(TrackError::Parse(_))));

    let result = parse_timed_text("<html><body>not a track</body></html>");
    assert!(matches!(result, Err(TrackError::Parse(_))));
}

/// Test that bad time values are reported instead of silently zeroed
#[test]
fn test_parseTimedText_withInvalidStart_shouldFail() {
    let result = parse_timed_text(r#"<transcript><text start="soon" dur="1">x</text></transcript>"#);
    assert!(matches!(result, Err(TrackError::Parse(_))));
}

/// Test the merge of the full sample track with default thresholds
#[test]
fn test_merge_withSampleTrack_shouldProduceFourGroups() {
    let cues = parse_timed_text(SAMPLE_TRACK).unwrap();
    let merged = SegmentMerger::default().merge(&cues);

    assert_eq!(
        merged,
        vec![
            MergedSubtitle::new(0, 4500, "hi there welcome back to the channel"),
            MergedSubtitle::new(20_000, 24_500, "today we're talking about the weather"),
            MergedSubtitle::new(40_000, 43_000, "it's going to rain"),
            MergedSubtitle::new(60_000, 65_000, "see you next time"),
        ]
    );
}

/// Test that merged groups respect every configured threshold
#[test]
fn test_merge_withManyCues_shouldRespectAllLimits() {
    let config = MergeConfig {
        max_gap_ms: 500,
        max_group_duration_ms: 4000,
        max_text_length: 20,
    };
    let cues: Vec<RawCue> = (0..40)
        .map(|i| {
            let start = i * 900;
            RawCue::new(start, start + 800, format!("word{}", i))
        })
        .collect();

    let merged = SegmentMerger::new(&config).merge(&cues);

    for group in &merged {
        assert!(group.end_ms - group.start_ms <= config.max_group_duration_ms);
        assert!(group.text.chars().count() <= config.max_text_length);
    }

    // Every cue lands in exactly one group, in order
    let rejoined: Vec<String> = merged
        .iter()
        .flat_map(|g| g.text.split(' ').map(str::to_string).collect::<Vec<_>>())
        .collect();
    let original: Vec<String> = cues.iter().map(|c| c.text.clone()).collect();
    assert_eq!(rejoined, original);
}

/// Test that an oversized cue forms its own group
#[test]
fn test_merge_withOversizedCue_shouldKeepItWhole() {
    let config = MergeConfig {
        max_text_length: 10,
        ..MergeConfig::default()
    };
    let cues = vec![
        RawCue::new(0, 1000, "short"),
        RawCue::new(1000, 2000, "this cue is far too long to fit"),
        RawCue::new(2000, 3000, "tail"),
    ];

    let merged = SegmentMerger::new(&config).merge(&cues);

    assert_eq!(merged.len(), 3);
    assert_eq!(merged[1].text, "this cue is far too long to fit");
}

/// Test the half-open activity interval of a merged subtitle
#[test]
fn test_mergedSubtitle_isActiveAt_shouldUseHalfOpenInterval() {
    let subtitle = MergedSubtitle::new(1000, 2000, "x");

    assert!(!subtitle.is_active_at(999));
    assert!(subtitle.is_active_at(1000));
    assert!(subtitle.is_active_at(1999));
    assert!(!subtitle.is_active_at(2000));
}
