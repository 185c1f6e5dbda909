//! Segment normalizer
//!
//! Single forward pass over raw segments in the order given. Input is
//! expected to be start-ascending already; it is never sorted here.
//!
//! Each segment's text is cleaned, its times resolved, and its start
//! pulled forward to the previous accepted end when they overlap. A
//! segment left with no text, or with `end <= start` after clamping, is
//! dropped. Ends are never moved.

use super::segment::{normalize_text, RawSegment, Segment};
use super::timecode::quantize_ms;

/// Why a raw segment did not survive normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    EmptyText,
    NonPositiveDuration,
}

/// A raw segment that was dropped, by its position in the input
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedSegment {
    pub index: usize,
    pub reason: DropReason,
}

/// Output of a normalization pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub segments: Vec<Segment>,
    pub dropped: Vec<DroppedSegment>,
}

/// Normalize a raw sequence, discarding the drop report.
pub fn normalize<'a, I>(raw: I) -> Vec<Segment>
where
    I: IntoIterator<Item = &'a RawSegment>,
{
    normalize_with_report(raw).segments
}

/// Normalize a raw sequence and report which inputs were dropped.
pub fn normalize_with_report<'a, I>(raw: I) -> NormalizeReport
where
    I: IntoIterator<Item = &'a RawSegment>,
{
    let mut report = NormalizeReport::default();
    let mut previous_end = 0.0_f64;

    for (index, seg) in raw.into_iter().enumerate() {
        let text = normalize_text(&seg.text);
        if text.is_empty() {
            tracing::debug!("Dropping segment {}: empty text", index);
            report.dropped.push(DroppedSegment {
                index,
                reason: DropReason::EmptyText,
            });
            continue;
        }

        // Times live on the millisecond grid SRT can express
        let mut start = quantize_ms(seg.start.seconds_or_default());
        let end = quantize_ms(seg.end.seconds_or_default());

        if start < previous_end {
            start = previous_end;
        }

        if end <= start {
            tracing::debug!(
                "Dropping segment {}: end {:.3} <= start {:.3}",
                index,
                end,
                start
            );
            report.dropped.push(DroppedSegment {
                index,
                reason: DropReason::NonPositiveDuration,
            });
            continue;
        }

        report.segments.push(Segment { start, end, text });
        previous_end = end;
    }

    report
}
