use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_LAYER, MIN_LAYER};
use crate::core::color::ColorToken;
use crate::core::time_code::{self, TimeCode};
use crate::error::{AnnotationError, FieldError, Result};

/// A layered, colored time range on the audio timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
    /// Unique, opaque identifier
    pub id: String,
    /// Stack layer, 1 (front, shortest) to 6 (back, tallest)
    pub layer: u8,
    /// Display name shown in the table and on the bubble
    #[serde(default)]
    pub bubble_name: String,
    /// Start of the range (`mm:ss:mmm`, empty while unset)
    pub start_time: TimeCode,
    /// End of the range (`mm:ss:mmm`, empty while unset)
    pub stop_time: TimeCode,
    /// Palette name or literal CSS color
    #[serde(default)]
    pub color: ColorToken,
}

impl Bubble {
    /// Create a bubble with a fresh id.
    pub fn new(
        layer: u8,
        bubble_name: impl Into<String>,
        start_time: TimeCode,
        stop_time: TimeCode,
        color: ColorToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            layer,
            bubble_name: bubble_name.into(),
            start_time,
            stop_time,
            color,
        }
    }

    /// Create an empty table row on a layer; both times start unset.
    pub fn row(layer: u8, color: ColorToken) -> Self {
        Self::new(layer, "", TimeCode::unset(), TimeCode::unset(), color)
    }

    /// Start and stop in seconds, for region materialization.
    pub fn bounds_seconds(&self) -> Result<(f64, f64)> {
        Ok((self.start_time.to_seconds()?, self.stop_time.to_seconds()?))
    }

    /// Whether both bounds are set.
    pub fn is_complete(&self) -> bool {
        !self.start_time.is_unset() && !self.stop_time.is_unset()
    }

    pub fn validate(&self) -> Result<()> {
        into_result(self.field_errors(true))
    }

    /// Field-level problems with this record. `check_order` controls the
    /// start < stop check, which interactive drags defer until they settle.
    pub(crate) fn field_errors(&self, check_order: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() {
            errors.push(FieldError::new("id", "must not be empty"));
        }
        if !(MIN_LAYER..=MAX_LAYER).contains(&self.layer) {
            errors.push(FieldError::new(
                "layer",
                format!("must be between {} and {}", MIN_LAYER, MAX_LAYER),
            ));
        }
        let start_ok = check_time_code("startTime", &self.start_time, &mut errors);
        let stop_ok = check_time_code("stopTime", &self.stop_time, &mut errors);
        if check_order && start_ok && stop_ok && self.is_complete() {
            if let (Ok(start), Ok(stop)) = (self.start_time.to_millis(), self.stop_time.to_millis()) {
                if start >= stop {
                    errors.push(FieldError::new("stopTime", "must be after startTime"));
                }
            }
        }
        if self.color.is_empty() {
            errors.push(FieldError::new("color", "must not be empty"));
        }
        errors
    }
}

fn check_time_code(field: &'static str, code: &TimeCode, errors: &mut Vec<FieldError>) -> bool {
    if code.is_unset() || time_code::validate(code.as_str()) {
        return true;
    }
    errors.push(FieldError::new(field, format!("{:?} is not a mm:ss:mmm time code", code.as_str())));
    false
}

pub(crate) fn into_result(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AnnotationError::ValidationFailed(errors))
    }
}

/// Partial bubble edit. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BubblePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubble_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<TimeCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorToken>,
}

impl BubblePatch {
    /// Patch that moves both bounds, as produced by a region drag.
    pub fn bounds(start_time: TimeCode, stop_time: TimeCode) -> Self {
        Self {
            start_time: Some(start_time),
            stop_time: Some(stop_time),
            ..Default::default()
        }
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.bubble_name = Some(name.into());
        self
    }

    pub fn with_start(mut self, start_time: impl Into<TimeCode>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn with_stop(mut self, stop_time: impl Into<TimeCode>) -> Self {
        self.stop_time = Some(stop_time.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<ColorToken>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether applying this patch can move the bubble on the timeline.
    pub fn touches_bounds(&self) -> bool {
        self.start_time.is_some() || self.stop_time.is_some()
    }

    pub fn apply_to(&self, bubble: &mut Bubble) {
        if let Some(layer) = self.layer {
            bubble.layer = layer;
        }
        if let Some(name) = &self.bubble_name {
            bubble.bubble_name = name.clone();
        }
        if let Some(start_time) = &self.start_time {
            bubble.start_time = start_time.clone();
        }
        if let Some(stop_time) = &self.stop_time {
            bubble.stop_time = stop_time.clone();
        }
        if let Some(color) = &self.color {
            bubble.color = color.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble(start: &str, stop: &str) -> Bubble {
        Bubble::new(1, "Intro", start.into(), stop.into(), ColorToken::new("Red"))
    }

    #[test]
    fn test_new_bubbles_get_unique_ids() {
        let a = bubble("00:01:000", "00:02:000");
        let b = bubble("00:01:000", "00:02:000");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_valid_bubble() {
        assert!(bubble("00:01:000", "00:02:000").validate().is_ok());
        assert!(Bubble::row(3, ColorToken::default()).validate().is_ok());
    }

    #[test]
    fn test_ordering_violation() {
        let err = bubble("00:02:000", "00:02:000").validate().unwrap_err();
        assert_eq!(err.field_errors()[0].field, "stopTime");
        assert!(bubble("00:02:000", "00:01:000").field_errors(false).is_empty());
    }

    #[test]
    fn test_collects_every_field_error() {
        let mut invalid = bubble("1:2", "soon");
        invalid.layer = 7;
        invalid.color = ColorToken::new("  ");
        let fields: Vec<&str> = invalid.field_errors(true).iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["layer", "startTime", "stopTime", "color"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(bubble("00:01:000", "00:02:000")).unwrap();
        for key in ["id", "layer", "bubbleName", "startTime", "stopTime", "color"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let parsed: std::result::Result<BubblePatch, _> = serde_json::from_str(r#"{"startTime":"00:01:000","start":"x"}"#);
        assert!(parsed.is_err());
        let parsed: BubblePatch = serde_json::from_str(r#"{"layer":2}"#).unwrap();
        assert_eq!(parsed, BubblePatch::default().with_layer(2));
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut target = bubble("00:01:000", "00:02:000");
        BubblePatch::default().with_name("Verse").with_stop("00:05:000").apply_to(&mut target);
        assert_eq!(target.bubble_name, "Verse");
        assert_eq!(target.start_time.as_str(), "00:01:000");
        assert_eq!(target.stop_time.as_str(), "00:05:000");
        assert_eq!(target.layer, 1);
    }
}
