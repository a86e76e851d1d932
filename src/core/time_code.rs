//! Time code conversions.
//!
//! A time code is the `mm:ss:mmm` string the bubble table shows and edits.
//! Geometry works in integer milliseconds, regions work in float seconds;
//! everything in this module converts between those three forms without drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AnnotationError, Result};

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;

/// A `mm:ss:mmm` duration string. The empty string means "not set yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeCode(String);

impl TimeCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// An unset time code (freshly created table rows).
    pub fn unset() -> Self {
        Self(String::new())
    }

    pub fn from_seconds(seconds: f64) -> Self {
        format(seconds)
    }

    pub fn from_millis(millis: u64) -> Self {
        format_millis(millis)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn is_valid(&self) -> bool {
        validate(&self.0)
    }

    pub fn to_millis(&self) -> Result<u64> {
        parse_to_millis(&self.0)
    }

    pub fn to_seconds(&self) -> Result<f64> {
        parse_to_seconds(&self.0)
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimeCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for TimeCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Parse a time code into milliseconds.
///
/// Accepts `mm:ss:mmm`, `mm:ss` and `ss:mmm` (a two-segment code whose last
/// segment has exactly three digits is read as seconds and milliseconds).
pub fn parse_to_millis(code: &str) -> Result<u64> {
    let malformed = || AnnotationError::MalformedTimeCode(code.to_string());
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(malformed());
    }

    let segments: Vec<&str> = trimmed.split(':').collect();
    let numbers = segments
        .iter()
        .map(|segment| parse_segment(segment))
        .collect::<Option<Vec<u64>>>()
        .ok_or_else(malformed)?;

    let (minutes, seconds, millis) = match numbers.as_slice() {
        [first, last] if segments[1].len() == 3 => (0, *first, *last),
        [minutes, seconds] => (*minutes, *seconds, 0),
        [minutes, seconds, millis] => (*minutes, *seconds, *millis),
        _ => return Err(malformed()),
    };

    if seconds >= 60 || millis >= MILLIS_PER_SECOND {
        return Err(malformed());
    }

    minutes
        .checked_mul(MILLIS_PER_MINUTE)
        .and_then(|total| total.checked_add(seconds * MILLIS_PER_SECOND + millis))
        .ok_or_else(malformed)
}

/// Rendering-path variant of [`parse_to_millis`]: an unset code reads as `0`.
/// Anything non-empty must still parse.
pub fn millis_or_zero(code: &str) -> Result<u64> {
    if code.trim().is_empty() {
        return Ok(0);
    }
    parse_to_millis(code)
}

pub fn parse_to_seconds(code: &str) -> Result<f64> {
    parse_to_millis(code).map(|millis| millis as f64 / MILLIS_PER_SECOND as f64)
}

/// Format seconds as a zero-padded `mm:ss:mmm` code, rounded to the nearest
/// millisecond. Negative and non-finite input formats as zero.
pub fn format(seconds: f64) -> TimeCode {
    format_millis(seconds_to_millis(seconds))
}

pub fn format_millis(millis: u64) -> TimeCode {
    let minutes = millis / MILLIS_PER_MINUTE;
    let seconds = (millis / MILLIS_PER_SECOND) % 60;
    let millis = millis % MILLIS_PER_SECOND;
    TimeCode(format!("{:02}:{:02}:{:03}", minutes, seconds, millis))
}

/// Round seconds to whole milliseconds, clamping invalid input to zero.
pub fn seconds_to_millis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * MILLIS_PER_SECOND as f64).round() as u64
}

/// Check a table edit against the time code grammar before it is committed.
///
/// Minutes are optional and unbounded, seconds are two digits below 60, and
/// milliseconds are an optional three-digit suffix. At least one `:` is
/// required so every accepted code also parses.
pub fn validate(code: &str) -> bool {
    static GRAMMAR: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(?:\d+:)?[0-5]\d(?::\d{3})?$").unwrap());
    let code = code.trim();
    code.contains(':') && GRAMMAR.is_match(code) && parse_to_millis(code).is_ok()
}

fn parse_segment(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    segment.parse::<u64>().ok()
}
