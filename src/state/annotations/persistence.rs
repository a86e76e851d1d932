//! JSON interchange for the annotation set (`bubblemachine-data.json`).

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{AnnotationSet, AnnotationStore};
use crate::constants::EXPORT_FILE_NAME;
use crate::error::{AnnotationError, Result};

const REQUIRED_KEYS: [&str; 2] = ["bubbles", "comments"];

/// Parse and validate an interchange document without touching any store.
///
/// Both top-level keys must be present (empty arrays are fine). Ids are kept
/// verbatim.
pub fn parse_document(text: &str) -> Result<AnnotationSet> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| AnnotationError::InvalidFormat(format!("not valid JSON: {}", err)))?;
    let object = value
        .as_object()
        .ok_or_else(|| AnnotationError::InvalidFormat("top level must be an object".to_string()))?;

    for key in REQUIRED_KEYS {
        match object.get(key) {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(AnnotationError::InvalidFormat(format!("\"{}\" must be an array", key)));
            }
            None => {
                return Err(AnnotationError::InvalidFormat(format!("missing \"{}\"", key)));
            }
        }
    }

    let set: AnnotationSet = serde_json::from_value(value)
        .map_err(|err| AnnotationError::InvalidFormat(format!("record does not match schema: {}", err)))?;
    set.validate()?;
    Ok(set)
}

pub fn export_document(set: &AnnotationSet) -> Result<String> {
    serde_json::to_string_pretty(set)
        .map_err(|err| AnnotationError::InvalidFormat(format!("could not serialize annotations: {}", err)))
}

/// Resolve an export/import target: directories get the default file name.
pub fn document_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(EXPORT_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

impl AnnotationStore {
    // =========================================================================
    // Export/Import
    // =========================================================================

    /// Pretty-printed document holding every field of every record.
    pub fn export_json(&self) -> Result<String> {
        export_document(self.data())
    }

    /// Parse `text` and replace the whole store with it.
    ///
    /// Destructive: callers decide whether a non-empty store may be replaced.
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let set = parse_document(text)?;
        self.replace_all(set)
    }

    /// Parse `text` and append its records. Any id already in the store fails
    /// the whole import with `DuplicateId`.
    pub fn merge_json(&mut self, text: &str) -> Result<()> {
        let set = parse_document(text)?;
        self.extend(set)
    }

    /// Write the document to `path` (a file, or a directory to hold the default file name).
    pub fn export_to_file(&self, path: &Path) -> Result<PathBuf> {
        let target = document_path(path);
        if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, self.export_json()?)?;
        info!(path = %target.display(), bubbles = self.bubbles().len(), comments = self.comments().len(), "annotations exported");
        Ok(target)
    }

    /// Read and parse a document from `path` without committing it.
    pub fn read_document(path: &Path) -> Result<AnnotationSet> {
        let target = document_path(path);
        let text = fs::read_to_string(&target)?;
        parse_document(&text).map_err(|err| {
            warn!(path = %target.display(), error = %err, "rejected annotation document");
            err
        })
    }

    /// Replace the store with the document at `path`.
    pub fn import_from_file(&mut self, path: &Path) -> Result<()> {
        let set = Self::read_document(path)?;
        self.replace_all(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::ColorToken;
    use crate::state::annotations::{Bubble, Comment};

    #[test]
    fn test_import_comment_only_document() {
        let mut store = AnnotationStore::default();
        store
            .import_json(r#"{"bubbles": [], "comments": [{"id":"c1","startTime":1.0,"endTime":2.0,"text":"hi"}]}"#)
            .unwrap();
        assert!(store.bubbles().is_empty());
        assert_eq!(store.comments().len(), 1);
        let comment = &store.comments()[0];
        assert_eq!(comment.id, "c1");
        assert_eq!(comment.start_time, 1.0);
        assert_eq!(comment.end_time, 2.0);
        assert_eq!(comment.text, "hi");
    }

    #[test]
    fn test_missing_top_level_key_is_invalid() {
        for text in [r#"{"bubbles": []}"#, r#"{"comments": []}"#, r#"{}"#, "[]", r#"{"bubbles": {}, "comments": []}"#] {
            assert!(
                matches!(parse_document(text), Err(AnnotationError::InvalidFormat(_))),
                "expected {text} to be rejected"
            );
        }
    }

    #[test]
    fn test_schema_mismatch_is_invalid_format() {
        let text = r#"{"bubbles": [{"id":"b1","layer":"one","startTime":"00:01:000","stopTime":"00:02:000"}], "comments": []}"#;
        assert!(matches!(parse_document(text), Err(AnnotationError::InvalidFormat(_))));
    }

    #[test]
    fn test_invalid_records_fail_validation() {
        let text = r#"{"bubbles": [{"id":"b1","layer":9,"startTime":"00:01:000","stopTime":"00:02:000","bubbleName":"","color":"Red"}], "comments": []}"#;
        assert!(matches!(parse_document(text), Err(AnnotationError::ValidationFailed(_))));
    }

    #[test]
    fn test_export_then_import_preserves_ids() {
        let mut source = AnnotationStore::default();
        let bubble = Bubble::new(2, "Hook", "00:05:000".into(), "00:10:000".into(), ColorToken::new("#abcdef"));
        let bubble_id = bubble.id.clone();
        source.add_bubble(bubble).unwrap();
        source.add_comment(Comment::new(3.0, 4.0, "note")).unwrap();

        let json = source.export_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value["bubbles"][0].get("bubbleName").is_some());
        assert!(json.contains('\n'), "export should be pretty-printed");

        let mut target = AnnotationStore::default();
        target.import_json(&json).unwrap();
        assert_eq!(target.snapshot(), source.snapshot());
        assert_eq!(target.bubbles()[0].id, bubble_id);
    }

    #[test]
    fn test_merging_same_document_twice_fails_with_duplicate() {
        let text = r#"{"bubbles": [], "comments": [{"id":"c1","startTime":1.0,"endTime":2.0,"text":"hi"}]}"#;
        let mut store = AnnotationStore::default();
        store.merge_json(text).unwrap();
        let err = store.merge_json(text).unwrap_err();
        assert!(matches!(err, AnnotationError::DuplicateId(id) if id == "c1"));
        assert_eq!(store.comments().len(), 1);
    }

    #[test]
    fn test_rejected_import_leaves_store_unchanged() {
        let mut store = AnnotationStore::default();
        store.add_comment(Comment::new(0.0, 1.0, "keep")).unwrap();
        let before = store.snapshot();
        assert!(store.import_json(r#"{"bubbles": []}"#).is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_file_round_trip_uses_default_name_for_directories() {
        let dir = std::env::temp_dir().join(format!("bubblemachine-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut store = AnnotationStore::default();
        store.add_comment(Comment::new(0.5, 0.75, "saved")).unwrap();
        let written = store.export_to_file(&dir).unwrap();
        assert_eq!(written, dir.join(EXPORT_FILE_NAME));

        let mut restored = AnnotationStore::default();
        restored.import_from_file(&dir).unwrap();
        assert_eq!(restored.comments()[0].text, "saved");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
