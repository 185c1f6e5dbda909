//! LRC lyric importer
//!
//! Turns `[mm:ss.xx]text` lines into raw segments. LRC carries no end
//! times, so they are synthesized from the distance to the next cue.

use super::segment::RawSegment;
use super::timecode::parse_lrc_time;

/// Subtracted from every decoded cue start. Compensates a systematic lag in
/// the lyric timestamps; the result may be negative.
pub const LEAD_IN_OFFSET_SECS: f64 = 1.0;

/// Cues closer than this to their successor end exactly where it starts.
pub const FOLLOW_GAP_SECS: f64 = 7.0;

/// Display time for a cue whose successor is far away.
pub const DWELL_SECS: f64 = 5.0;

/// Display time for the final cue.
pub const LAST_DWELL_SECS: f64 = 8.0;

/// A timestamped lyric line
#[derive(Debug, Clone, PartialEq)]
pub struct LrcCue {
    /// Decoded timestamp, before the lead-in offset
    pub time: f64,
    pub text: String,
}

/// Extract timestamped cues, skipping metadata tags and non-lyric lines.
pub fn parse_cues(input: &str) -> Vec<LrcCue> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut cues = Vec::new();

    for (lineno, line) in input.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        let Some(rest) = line.strip_prefix('[') else {
            continue;
        };
        let Some(close) = rest.find(']') else {
            continue;
        };

        let tag = &rest[..close];
        let text = rest[close + 1..].trim_start();

        match parse_lrc_time(tag) {
            Ok(time) => cues.push(LrcCue {
                time,
                text: text.to_string(),
            }),
            Err(e) => tracing::debug!("Skipping LRC line {}: {}", lineno + 1, e),
        }
    }

    cues
}

/// Convert LRC text into raw segments ready for normalization.
pub fn import_lrc(input: &str) -> Vec<RawSegment> {
    cues_to_segments(&parse_cues(input))
}

/// Synthesize end times and apply the lead-in offset.
///
/// End times are derived from the decoded timestamps; only starts are shifted.
pub fn cues_to_segments(cues: &[LrcCue]) -> Vec<RawSegment> {
    cues.iter()
        .enumerate()
        .map(|(k, cue)| {
            let end = match cues.get(k + 1) {
                Some(next) if next.time - cue.time < FOLLOW_GAP_SECS => next.time,
                Some(_) => cue.time + DWELL_SECS,
                None => cue.time + LAST_DWELL_SECS,
            };
            RawSegment::new(cue.time - LEAD_IN_OFFSET_SECS, end, cue.text.clone())
        })
        .collect()
}
