//! Bubble color tokens.
//!
//! A token is either one of the named palette entries or a literal CSS color
//! (hex or `rgba(...)`), which passes through resolution untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    DEFAULT_BUBBLE_COLOR, PALETTE_BLACK, PALETTE_BLUE, PALETTE_BROWN, PALETTE_GRAY, PALETTE_GREEN,
    PALETTE_ORANGE, PALETTE_PINK, PALETTE_PURPLE, PALETTE_RED, PALETTE_WHITE, PALETTE_YELLOW,
};

/// Palette names offered by the bubble table's color picker, in display order.
pub const PALETTE_NAMES: [&str; 11] = [
    "Red", "Green", "Blue", "Yellow", "Purple", "Orange", "Pink", "Brown", "Gray", "White", "Black",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorToken(String);

impl ColorToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Resolve to a display value: palette hex for named tokens, the literal otherwise.
    pub fn resolve(&self) -> String {
        resolve_color(&self.0)
    }

    /// Resolved color with its alpha replaced by `opacity`, for region fills.
    pub fn with_opacity(&self, opacity: f64) -> String {
        apply_opacity(&self.resolve(), opacity)
    }
}

impl Default for ColorToken {
    fn default() -> Self {
        Self(DEFAULT_BUBBLE_COLOR.to_string())
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColorToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

pub fn palette_hex(name: &str) -> Option<&'static str> {
    let hex = match name.trim().to_ascii_lowercase().as_str() {
        "red" => PALETTE_RED,
        "green" => PALETTE_GREEN,
        "blue" => PALETTE_BLUE,
        "yellow" => PALETTE_YELLOW,
        "purple" => PALETTE_PURPLE,
        "orange" => PALETTE_ORANGE,
        "pink" => PALETTE_PINK,
        "brown" => PALETTE_BROWN,
        "gray" | "grey" => PALETTE_GRAY,
        "white" => PALETTE_WHITE,
        "black" => PALETTE_BLACK,
        _ => return None,
    };
    Some(hex)
}

pub fn resolve_color(token: &str) -> String {
    palette_hex(token)
        .map(str::to_string)
        .unwrap_or_else(|| token.trim().to_string())
}

/// Convert `#rgb`/`#rrggbb`/`#rrggbbaa`/`rgb(..)`/`rgba(..)` into `rgba(r, g, b, opacity)`.
/// Values in any other notation are returned unchanged.
pub fn apply_opacity(color: &str, opacity: f64) -> String {
    let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 };
    match parse_rgb(color) {
        Some((r, g, b)) => format!("rgba({}, {}, {}, {})", r, g, b, opacity),
        None => color.to_string(),
    }
}

fn parse_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = color.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let channels: Vec<u8> = inner
        .split(',')
        .take(3)
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;
    match channels.as_slice() {
        [r, g, b] => Some((*r, *g, *b)),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let digit = |index: usize| u8::from_str_radix(&hex[index..index + 1], 16).ok().map(|v| v * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        6 | 8 => {
            let pair = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();
            Some((pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_tokens_resolve_case_insensitively() {
        assert_eq!(ColorToken::new("Red").resolve(), PALETTE_RED);
        assert_eq!(ColorToken::new("purple").resolve(), PALETTE_PURPLE);
        assert_eq!(ColorToken::new("GREY").resolve(), PALETTE_GRAY);
        for name in PALETTE_NAMES {
            assert!(palette_hex(name).is_some(), "{name} missing from palette");
        }
    }

    #[test]
    fn test_literals_pass_through() {
        assert_eq!(ColorToken::new("#123456").resolve(), "#123456");
        assert_eq!(ColorToken::new("rgba(1, 2, 3, 0.5)").resolve(), "rgba(1, 2, 3, 0.5)");
        assert_eq!(ColorToken::new("teal").resolve(), "teal");
    }

    #[test]
    fn test_opacity_reduction() {
        assert_eq!(ColorToken::new("#ff8000").with_opacity(0.3), "rgba(255, 128, 0, 0.3)");
        assert_eq!(ColorToken::new("#fff").with_opacity(0.5), "rgba(255, 255, 255, 0.5)");
        assert_eq!(ColorToken::new("rgba(10, 20, 30, 1)").with_opacity(0.25), "rgba(10, 20, 30, 0.25)");
        assert_eq!(ColorToken::new("Blue").with_opacity(0.3), "rgba(59, 130, 246, 0.3)");
        assert_eq!(ColorToken::new("teal").with_opacity(0.3), "teal");
    }
}
