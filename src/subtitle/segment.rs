//! Segment model
//!
//! `RawSegment` is what producers hand over (transcription engine, SRT
//! parser, LRC importer, edited segments from a client). `Segment` is the
//! validated form produced by the normalizer.

use serde::{Deserialize, Serialize};

use super::timecode::{check_seconds, parse_time};
use crate::error::TimeParseError;

/// A time as received from outside: seconds, or a string holding either
/// seconds (`"12.5"`) or an SRT timestamp (`"00:00:12,500"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Text(String),
}

impl TimeValue {
    /// Resolve to canonical seconds.
    pub fn to_seconds(&self) -> Result<f64, TimeParseError> {
        match self {
            TimeValue::Seconds(v) => check_seconds(&v.to_string(), *v),
            TimeValue::Text(s) => parse_time(s),
        }
    }

    /// Resolve to canonical seconds, substituting `0.0` for malformed input.
    pub fn seconds_or_default(&self) -> f64 {
        match self.to_seconds() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{}; using 0.0", e);
                0.0
            }
        }
    }
}

impl From<f64> for TimeValue {
    fn from(v: f64) -> Self {
        TimeValue::Seconds(v)
    }
}

impl From<&str> for TimeValue {
    fn from(s: &str) -> Self {
        TimeValue::Text(s.to_string())
    }
}

/// A segment before normalization. Nothing about it is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub start: TimeValue,
    pub end: TimeValue,
    #[serde(default)]
    pub text: String,
}

impl RawSegment {
    pub fn new(start: impl Into<TimeValue>, end: impl Into<TimeValue>, text: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            text: text.into(),
        }
    }
}

/// A normalized segment: `end > start`, `start >= 0`, non-empty single-line text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Seconds from media start
    pub start: f64,
    /// Seconds from media start
    pub end: f64,
    pub text: String,
}

impl From<Segment> for RawSegment {
    fn from(s: Segment) -> Self {
        RawSegment::new(s.start, s.end, s.text)
    }
}

impl From<&Segment> for RawSegment {
    fn from(s: &Segment) -> Self {
        RawSegment::new(s.start, s.end, s.text.clone())
    }
}

/// Collapse line breaks into spaces and trim surrounding whitespace.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(|c: char| c == '\n' || c == '\r', " ")
        .trim()
        .to_string()
}
