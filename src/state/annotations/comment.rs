use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bubble::into_result;
use crate::constants::COMMENT_MAX_CHARS;
use crate::error::{FieldError, Result};

/// A free-text note anchored to a time span (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique identifier
    pub id: String,
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    /// Note text, at most 2000 characters
    pub text: String,
}

impl Comment {
    /// Create a comment with a fresh id. Surrounding whitespace is dropped
    /// from the text.
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time,
            end_time,
            text: text.into().trim().to_string(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn validate(&self) -> Result<()> {
        into_result(self.field_errors())
    }

    pub(crate) fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() {
            errors.push(FieldError::new("id", "must not be empty"));
        }
        let start_ok = check_seconds("startTime", self.start_time, &mut errors);
        let end_ok = check_seconds("endTime", self.end_time, &mut errors);
        if start_ok && end_ok && self.start_time > self.end_time {
            errors.push(FieldError::new("endTime", "must not be before startTime"));
        }
        if self.text.trim().is_empty() {
            errors.push(FieldError::new("text", "must not be empty"));
        } else if self.text.chars().count() > COMMENT_MAX_CHARS {
            errors.push(FieldError::new(
                "text",
                format!("must be at most {} characters", COMMENT_MAX_CHARS),
            ));
        }
        errors
    }
}

fn check_seconds(field: &'static str, value: f64, errors: &mut Vec<FieldError>) -> bool {
    if value.is_finite() && value >= 0.0 {
        return true;
    }
    errors.push(FieldError::new(field, "must be a non-negative number of seconds"));
    false
}

/// Partial comment edit. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CommentPatch {
    pub fn bounds(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, comment: &mut Comment) {
        if let Some(start_time) = self.start_time {
            comment.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            comment.end_time = end_time;
        }
        if let Some(text) = &self.text {
            comment.text = text.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_comment_is_valid() {
        assert!(Comment::new(4.0, 4.0, "downbeat").validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_and_oversized_text() {
        let blank = Comment::new(1.0, 2.0, "   ");
        assert_eq!(blank.field_errors()[0].field, "text");

        let long = Comment::new(1.0, 2.0, "x".repeat(COMMENT_MAX_CHARS + 1));
        assert_eq!(long.field_errors()[0].field, "text");

        let at_limit = Comment::new(1.0, 2.0, "x".repeat(COMMENT_MAX_CHARS));
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_rejects_reversed_or_invalid_times() {
        let reversed = Comment::new(3.0, 2.0, "late");
        assert_eq!(reversed.field_errors()[0].field, "endTime");

        let nan = Comment::new(f64::NAN, 2.0, "nan");
        assert_eq!(nan.field_errors()[0].field, "startTime");
    }

    #[test]
    fn test_text_is_trimmed_on_create_and_edit() {
        let mut comment = Comment::new(1.0, 2.0, "  kick drum \n");
        assert_eq!(comment.text, "kick drum");

        CommentPatch::text("\tsnare  ").apply_to(&mut comment);
        assert_eq!(comment.text, "snare");
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Comment::new(1.0, 2.0, "hi")).unwrap();
        for key in ["id", "startTime", "endTime", "text"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
