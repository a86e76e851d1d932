//! Mark-start / mark-end capture of new bubbles from the playback position.

use crate::core::color::ColorToken;
use crate::core::time_code::{self, TimeCode};
use crate::error::{AnnotationError, FieldError, Result};
use crate::state::annotations::Bubble;

/// What the user chose for the bubble being marked.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleDraft {
    pub layer: u8,
    pub bubble_name: String,
    /// Falls back to the engine's default color when `None`.
    pub color: Option<ColorToken>,
}

impl BubbleDraft {
    pub fn new(layer: u8, bubble_name: impl Into<String>) -> Self {
        Self {
            layer,
            bubble_name: bubble_name.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<ColorToken>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Holds the pending start between mark-start and mark-end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkCapture {
    pending_start: Option<f64>,
}

impl MarkCapture {
    pub fn mark_start(&mut self, position_seconds: f64) -> Result<()> {
        check_position("startTime", position_seconds)?;
        self.pending_start = Some(position_seconds);
        Ok(())
    }

    pub fn pending_start(&self) -> Option<f64> {
        self.pending_start
    }

    pub fn is_marking(&self) -> bool {
        self.pending_start.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending_start = None;
    }

    /// Close the pending mark and build a bubble with a fresh id.
    ///
    /// The two positions are ordered, so marking backwards still yields
    /// start < stop. A mark that rounds to zero length is rejected and the
    /// pending start is kept.
    pub fn mark_end(&mut self, position_seconds: f64, draft: BubbleDraft, default_color: &ColorToken) -> Result<Bubble> {
        check_position("stopTime", position_seconds)?;
        let start = self.pending_start.ok_or_else(|| {
            AnnotationError::ValidationFailed(vec![FieldError::new("startTime", "mark a start position first")])
        })?;

        let a = time_code::seconds_to_millis(start);
        let b = time_code::seconds_to_millis(position_seconds);
        if a == b {
            return Err(AnnotationError::ValidationFailed(vec![FieldError::new(
                "stopTime",
                "must be after startTime",
            )]));
        }
        let (start_ms, stop_ms) = if a < b { (a, b) } else { (b, a) };

        let bubble = Bubble::new(
            draft.layer,
            draft.bubble_name,
            TimeCode::from_millis(start_ms),
            TimeCode::from_millis(stop_ms),
            draft.color.unwrap_or_else(|| default_color.clone()),
        );
        bubble.validate()?;
        self.pending_start = None;
        Ok(bubble)
    }
}

fn check_position(field: &'static str, position_seconds: f64) -> Result<()> {
    if position_seconds.is_finite() && position_seconds >= 0.0 {
        return Ok(());
    }
    Err(AnnotationError::ValidationFailed(vec![FieldError::new(
        field,
        "playback position must be a non-negative number of seconds",
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_start_then_end_builds_bubble() {
        let mut capture = MarkCapture::default();
        capture.mark_start(5.0).unwrap();
        assert!(capture.is_marking());

        let bubble = capture
            .mark_end(10.25, BubbleDraft::new(2, "Verse"), &ColorToken::new("Red"))
            .unwrap();
        assert_eq!(bubble.start_time.as_str(), "00:05:000");
        assert_eq!(bubble.stop_time.as_str(), "00:10:250");
        assert_eq!(bubble.color.as_str(), "Red");
        assert!(!capture.is_marking());
    }

    #[test]
    fn test_backwards_mark_is_ordered() {
        let mut capture = MarkCapture::default();
        capture.mark_start(8.0).unwrap();
        let bubble = capture
            .mark_end(3.0, BubbleDraft::new(1, "").with_color("#00ff00"), &ColorToken::default())
            .unwrap();
        assert_eq!(bubble.start_time.as_str(), "00:03:000");
        assert_eq!(bubble.stop_time.as_str(), "00:08:000");
        assert_eq!(bubble.color.as_str(), "#00ff00");
    }

    #[test]
    fn test_end_without_start_is_rejected() {
        let mut capture = MarkCapture::default();
        let err = capture
            .mark_end(3.0, BubbleDraft::new(1, ""), &ColorToken::default())
            .unwrap_err();
        assert_eq!(err.field_errors()[0].field, "startTime");
    }

    #[test]
    fn test_zero_length_keeps_pending_start() {
        let mut capture = MarkCapture::default();
        capture.mark_start(4.0).unwrap();
        assert!(capture.mark_end(4.0, BubbleDraft::new(1, ""), &ColorToken::default()).is_err());
        assert_eq!(capture.pending_start(), Some(4.0));
    }

    #[test]
    fn test_invalid_layer_keeps_pending_start() {
        let mut capture = MarkCapture::default();
        capture.mark_start(1.0).unwrap();
        let err = capture
            .mark_end(2.0, BubbleDraft::new(0, ""), &ColorToken::default())
            .unwrap_err();
        assert_eq!(err.field_errors()[0].field, "layer");
        assert!(capture.is_marking());
    }
}
