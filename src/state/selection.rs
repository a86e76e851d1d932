//! Selection state shared between the bubble table and the waveform.

/// Tracks which record is selected for editing.
///
/// Only one record is selected at a time; the selected bubble is the one the
/// waveform materializes as a draggable region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Selected bubble id.
    pub bubble_id: Option<String>,
    /// Selected comment id.
    pub comment_id: Option<String>,
}

impl SelectionState {
    /// Clear all selections.
    pub fn clear(&mut self) {
        self.bubble_id = None;
        self.comment_id = None;
    }

    /// Replace the selection with a single bubble.
    pub fn select_bubble(&mut self, bubble_id: impl Into<String>) {
        self.clear();
        self.bubble_id = Some(bubble_id.into());
    }

    /// Replace the selection with a single comment.
    pub fn select_comment(&mut self, comment_id: impl Into<String>) {
        self.clear();
        self.comment_id = Some(comment_id.into());
    }

    /// Drop a bubble from the selection, if it is the selected one.
    pub fn remove_bubble(&mut self, bubble_id: &str) -> bool {
        if self.bubble_id.as_deref() == Some(bubble_id) {
            self.bubble_id = None;
            return true;
        }
        false
    }

    /// Drop a comment from the selection, if it is the selected one.
    pub fn remove_comment(&mut self, comment_id: &str) -> bool {
        if self.comment_id.as_deref() == Some(comment_id) {
            self.comment_id = None;
            return true;
        }
        false
    }

    /// Return the selected bubble, if any.
    pub fn primary_bubble(&self) -> Option<&str> {
        self.bubble_id.as_deref()
    }

    /// Return the selected comment, if any.
    pub fn primary_comment(&self) -> Option<&str> {
        self.comment_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selecting_replaces_previous() {
        let mut selection = SelectionState::default();
        selection.select_comment("c1");
        selection.select_bubble("b1");
        assert_eq!(selection.primary_bubble(), Some("b1"));
        assert_eq!(selection.primary_comment(), None);
    }

    #[test]
    fn test_remove_only_matching_bubble() {
        let mut selection = SelectionState::default();
        selection.select_bubble("b1");
        assert!(!selection.remove_bubble("b2"));
        assert!(selection.remove_bubble("b1"));
        assert_eq!(selection.primary_bubble(), None);
    }
}
