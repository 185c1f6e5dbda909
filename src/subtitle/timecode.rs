//! Time codec
//!
//! Converts the three timestamp dialects seen at the edges of the system
//! into canonical seconds, and canonical seconds back into SRT display form:
//! - numeric seconds (transcription output, edited segments)
//! - SRT `HH:MM:SS,mmm` (also accepts `.` as the decimal separator)
//! - LRC `mm:ss.xx` where the fraction counts hundredths of a second

use crate::error::TimeParseError;

/// Parse an SRT display timestamp (`HH:MM:SS,mmm` or `HH:MM:SS.mmm`) into seconds.
///
/// The fractional field is a millisecond count; when absent it defaults to 0.
/// Hours may have more than two digits.
pub fn parse_srt_time(input: &str) -> Result<f64, TimeParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(TimeParseError::new(input, "empty timestamp"));
    }

    let (clock, fraction) = match s.find(|c: char| c == ',' || c == '.') {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };

    let fields: Vec<&str> = clock.split(':').collect();
    if fields.len() != 3 {
        return Err(TimeParseError::new(input, "expected HH:MM:SS"));
    }

    let hours = parse_field(input, fields[0])?;
    let minutes = parse_field(input, fields[1])?;
    let seconds = parse_field(input, fields[2])?;
    let millis = match fraction {
        Some(f) => parse_field(input, f)?,
        None => 0,
    };

    let total_ms = clock_seconds(hours, minutes, seconds)
        .and_then(|secs| secs.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(|| TimeParseError::new(input, "field out of range"))?;

    Ok(ms_to_seconds(total_ms))
}

/// Parse an LRC timestamp `mm:ss.xx` into seconds.
///
/// The fraction is divided by 100 whatever its width.
pub fn parse_lrc_time(input: &str) -> Result<f64, TimeParseError> {
    let caps = regex!(r"^(\d+):(\d+)\.(\d+)$")
        .captures(input.trim())
        .ok_or_else(|| TimeParseError::new(input, "expected mm:ss.xx"))?;

    let minutes = parse_field(input, &caps[1])?;
    let seconds = parse_field(input, &caps[2])?;
    let hundredths = parse_field(input, &caps[3])?;

    let whole = clock_seconds(0, minutes, seconds)
        .ok_or_else(|| TimeParseError::new(input, "field out of range"))?;

    Ok(whole as f64 + hundredths as f64 / 100.0)
}

/// Parse free-form time input: a plain number of seconds or an SRT timestamp.
pub fn parse_time(input: &str) -> Result<f64, TimeParseError> {
    let s = input.trim();
    if !s.contains(':') {
        return match s.parse::<f64>() {
            Ok(v) => check_seconds(input, v),
            Err(_) => Err(TimeParseError::new(input, "not a number of seconds")),
        };
    }
    parse_srt_time(s)
}

/// Validate a numeric seconds value.
pub fn check_seconds(input: &str, value: f64) -> Result<f64, TimeParseError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TimeParseError::new(input, "not a finite number"))
    }
}

/// Seconds for a whole number of milliseconds.
pub fn ms_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Round seconds to the millisecond grid SRT can represent.
///
/// Yields the same value `parse_srt_time` returns for the formatted time,
/// so quantized times survive a format/parse cycle unchanged.
pub fn quantize_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Format seconds as `HH:MM:SS,mmm`, rounded to the nearest millisecond.
///
/// Negative and non-finite values render as zero. Hours are not wrapped at 24.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

fn clock_seconds(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

fn parse_field(input: &str, field: &str) -> Result<u64, TimeParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::new(input, "non-numeric field"));
    }
    field
        .parse::<u64>()
        .map_err(|_| TimeParseError::new(input, "field out of range"))
}
