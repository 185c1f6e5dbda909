//! Subtitle core
//!
//! This module holds everything between raw timed text and SRT output:
//! - Time codec for seconds, SRT and LRC timestamps
//! - Segment model and text cleanup
//! - Normalizer (ordering, overlap clamping, drops)
//! - SRT serializer and parser
//! - LRC importer
//!
//! All of it is pure and stateless.

// helper.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

pub mod lrc;
pub mod normalize;
pub mod segment;
pub mod srt;
pub mod timecode;

pub use normalize::{normalize, normalize_with_report, DropReason, NormalizeReport};
pub use segment::{RawSegment, Segment, TimeValue};
pub use srt::{parse_srt, parse_srt_with_report, to_srt};

/// A normalized sequence together with its SRT rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDocument {
    pub segments: Vec<Segment>,
    pub srt: String,
    /// Number of raw segments dropped during normalization
    pub dropped: usize,
}

impl SubtitleDocument {
    /// Normalize raw segments and render them as SRT.
    pub fn from_raw(raw: &[RawSegment]) -> Self {
        let report = normalize_with_report(raw);
        let srt = to_srt(&report.segments);
        if !report.dropped.is_empty() {
            tracing::info!(
                "Normalized {} segment(s), dropped {}",
                report.segments.len(),
                report.dropped.len()
            );
        }
        Self {
            segments: report.segments,
            srt,
            dropped: report.dropped.len(),
        }
    }

    /// Parse SRT text and re-normalize it.
    pub fn from_srt(input: &str) -> Self {
        Self::from_raw(&parse_srt(input))
    }

    /// Import LRC text and normalize it.
    pub fn from_lrc(input: &str) -> Self {
        Self::from_raw(&lrc::import_lrc(input))
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
