//! SRT serializer and parser
//!
//! Output format per cue, blocks separated by one blank line and no
//! trailing blank line:
//!
//! ```text
//! 1
//! 00:00:00,000 --> 00:00:02,000
//! Hello
//! ```
//!
//! The parser ignores stored indices (the serializer numbers cues afresh)
//! and keeps only the first text line of each block.

use super::segment::{RawSegment, Segment};
use super::timecode::{format_srt_time, parse_srt_time};
use crate::error::BlockParseError;

/// Render an already normalized sequence. Numbering is 1-based and contiguous.
pub fn to_srt(segments: &[Segment]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            format!(
                "{}\n{} --> {}\n{}",
                i + 1,
                format_srt_time(seg.start),
                format_srt_time(seg.end),
                seg.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Result of parsing SRT text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SrtParseReport {
    pub segments: Vec<RawSegment>,
    pub skipped: Vec<BlockParseError>,
}

/// Parse SRT text into raw segments, silently skipping malformed blocks.
pub fn parse_srt(input: &str) -> Vec<RawSegment> {
    parse_srt_with_report(input).segments
}

/// Parse SRT text into raw segments and report the blocks that were skipped.
pub fn parse_srt_with_report(input: &str) -> SrtParseReport {
    let mut report = SrtParseReport::default();

    for (ordinal, block) in split_blocks(input).into_iter().enumerate() {
        match parse_block(&block) {
            Ok(seg) => report.segments.push(seg),
            Err(reason) => {
                let err = BlockParseError {
                    block: ordinal + 1,
                    reason,
                };
                tracing::warn!("{}", err);
                report.skipped.push(err);
            }
        }
    }

    report
}

/// Group non-blank lines into blocks. Handles CRLF and a leading BOM.
fn split_blocks(input: &str) -> Vec<Vec<&str>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in input.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str]) -> Result<RawSegment, String> {
    // lines[0] is the stored index, which is not trusted
    let timing = lines
        .get(1)
        .ok_or_else(|| "missing timing line".to_string())?;
    let text = lines.get(2).ok_or_else(|| "missing text line".to_string())?;

    let caps = regex!(r"^\s*([0-9:,.]+)\s*-->\s*([0-9:,.]+)")
        .captures(timing)
        .ok_or_else(|| format!("unrecognized timing line {:?}", timing))?;

    let start = parse_comma_time(&caps[1])?;
    let end = parse_comma_time(&caps[2])?;

    Ok(RawSegment::new(start, end, text.trim()))
}

fn parse_comma_time(s: &str) -> Result<f64, String> {
    if !regex!(r"^\d+:\d+:\d+,\d+$").is_match(s) {
        return Err(format!("timestamp {:?} is not HH:MM:SS,mmm", s));
    }
    parse_srt_time(s).map_err(|e| e.to_string())
}
