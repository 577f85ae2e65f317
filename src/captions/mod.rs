/*!
 * Caption track handling.
 *
 * - `track`: fetching and parsing timed-text tracks into raw cues
 * - `merger`: regrouping raw cues into display-sized subtitles
 * - `entities`: HTML entity decoding shared with the cache normalizer
 */

pub mod entities;
pub mod merger;
pub mod track;

pub use self::merger::{MergedSubtitle, SegmentMerger};
pub use self::track::{RawCue, TrackFetcher, parse_timed_text};
