use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: SRT timecode codec

// @const: Strict HH:MM:SS,mmm grammar, ASCII digits only
static TIMECODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2}):([0-9]{2}):([0-9]{2}),([0-9]{3})$").expect("timecode regex is valid")
});

/// Parse a `HH:MM:SS,mmm` timecode into whole milliseconds.
///
/// Fields are taken at face value: `00:99:99,999` is accepted because every
/// field has the right number of digits.
pub fn to_millis(timecode: &str) -> Result<u64, SubtitleError> {
    let caps = TIMECODE_REGEX
        .captures(timecode)
        .ok_or_else(|| SubtitleError::Format(timecode.to_string()))?;

    let field = |idx: usize| -> Result<u64, SubtitleError> {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .ok_or_else(|| SubtitleError::Format(timecode.to_string()))
    };

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let millis = field(4)?;

    Ok((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
}

/// Parse a `HH:MM:SS,mmm` timecode into seconds.
///
/// Computed from the integer millisecond total so that values such as `2.0`
/// or `1.5` come out exact and threshold comparisons stay stable.
pub fn to_seconds(timecode: &str) -> Result<f64, SubtitleError> {
    Ok(to_millis(timecode)? as f64 / 1000.0)
}

/// Format milliseconds as `HH:MM:SS,mmm`
pub fn format_millis(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format seconds as `HH:MM:SS,mmm`, rounding to the nearest millisecond.
/// Negative and non-finite inputs clamp to zero.
pub fn from_seconds(seconds: f64) -> String {
    let ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    format_millis(ms)
}
