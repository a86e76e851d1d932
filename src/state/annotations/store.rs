use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use super::{Bubble, BubblePatch, Comment, CommentPatch};
use crate::error::{AnnotationError, FieldError, Result};

/// The full annotation set, and the shape of the interchange document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    /// Bubbles in insertion order
    pub bubbles: Vec<Bubble>,
    /// Comments in insertion order
    pub comments: Vec<Comment>,
}

impl AnnotationSet {
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty() && self.comments.is_empty()
    }

    /// Check every record and reject ids repeated within a collection.
    pub fn validate(&self) -> Result<()> {
        ensure_unique(self.bubbles.iter().map(|bubble| bubble.id.as_str()))?;
        ensure_unique(self.comments.iter().map(|comment| comment.id.as_str()))?;

        let mut errors: Vec<FieldError> = Vec::new();
        for bubble in &self.bubbles {
            errors.extend(bubble.field_errors(true).into_iter().map(|error| prefixed("bubble", &bubble.id, error)));
        }
        for comment in &self.comments {
            errors.extend(comment.field_errors().into_iter().map(|error| prefixed("comment", &comment.id, error)));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AnnotationError::ValidationFailed(errors))
        }
    }
}

fn prefixed(kind: &str, id: &str, error: FieldError) -> FieldError {
    FieldError::new(error.field, format!("{} {}: {}", kind, id, error.message))
}

fn ensure_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(AnnotationError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

/// What a committed mutation changed. Delivered to subscribers after the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    BubbleAdded(String),
    BubbleUpdated(String),
    BubbleRemoved(String),
    BubblesCleared,
    CommentAdded(String),
    CommentUpdated(String),
    CommentRemoved(String),
    CommentsCleared,
    /// The whole set was swapped (destructive import).
    Replaced,
    /// Records were appended in bulk (merge import).
    Merged { bubbles: usize, comments: usize },
}

impl StoreChange {
    /// Id of the bubble this change is about, if it targets a single bubble.
    pub fn bubble_id(&self) -> Option<&str> {
        match self {
            StoreChange::BubbleAdded(id) | StoreChange::BubbleUpdated(id) | StoreChange::BubbleRemoved(id) => {
                Some(id)
            }
            _ => None,
        }
    }
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&StoreChange, &AnnotationSet)>;

/// Canonical, mutable collection of bubbles and comments.
///
/// Records are addressed by id only. Every mutation validates on a copy first,
/// so a failed call leaves the store exactly as it was.
pub struct AnnotationStore {
    data: AnnotationSet,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self {
            data: AnnotationSet::default(),
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }
}

impl fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("data", &self.data)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AnnotationStore {
    /// Create a store seeded with `initial`, which must pass validation.
    pub fn new(initial: AnnotationSet) -> Result<Self> {
        initial.validate()?;
        Ok(Self {
            data: initial,
            ..Default::default()
        })
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.data.bubbles
    }

    pub fn comments(&self) -> &[Comment] {
        &self.data.comments
    }

    pub fn data(&self) -> &AnnotationSet {
        &self.data
    }

    pub fn snapshot(&self) -> AnnotationSet {
        self.data.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bubble(&self, id: &str) -> Option<&Bubble> {
        self.data.bubbles.iter().find(|bubble| bubble.id == id)
    }

    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.data.comments.iter().find(|comment| comment.id == id)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a listener called after every committed change.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreChange, &AnnotationSet) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let len = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() < len
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self, change: StoreChange) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change, &self.data);
        }
    }

    // =========================================================================
    // Bubbles
    // =========================================================================

    pub fn add_bubble(&mut self, bubble: Bubble) -> Result<()> {
        if self.bubble(&bubble.id).is_some() {
            return Err(AnnotationError::DuplicateId(bubble.id));
        }
        bubble.validate()?;
        let id = bubble.id.clone();
        self.data.bubbles.push(bubble);
        debug!(bubble_id = %id, "bubble added");
        self.notify(StoreChange::BubbleAdded(id));
        Ok(())
    }

    /// Merge `patch` into the bubble with `id` and commit it if the result is valid.
    pub fn update_bubble(&mut self, id: &str, patch: &BubblePatch) -> Result<()> {
        self.merge_bubble(id, patch, true)
    }

    /// Drag-path update: like [`update_bubble`](Self::update_bubble) but the
    /// start < stop check waits until the drag settles.
    pub fn update_bubble_interactive(&mut self, id: &str, patch: &BubblePatch) -> Result<()> {
        self.merge_bubble(id, patch, false)
    }

    fn merge_bubble(&mut self, id: &str, patch: &BubblePatch, check_order: bool) -> Result<()> {
        let index = self
            .data
            .bubbles
            .iter()
            .position(|bubble| bubble.id == id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_string()))?;

        let mut merged = self.data.bubbles[index].clone();
        patch.apply_to(&mut merged);
        let errors = merged.field_errors(check_order);
        if !errors.is_empty() {
            return Err(AnnotationError::ValidationFailed(errors));
        }

        if merged == self.data.bubbles[index] {
            return Ok(());
        }
        self.data.bubbles[index] = merged;
        debug!(bubble_id = %id, interactive = !check_order, "bubble updated");
        self.notify(StoreChange::BubbleUpdated(id.to_string()));
        Ok(())
    }

    pub fn delete_bubble(&mut self, id: &str) -> Result<Bubble> {
        let index = self
            .data
            .bubbles
            .iter()
            .position(|bubble| bubble.id == id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_string()))?;
        let removed = self.data.bubbles.remove(index);
        debug!(bubble_id = %id, "bubble deleted");
        self.notify(StoreChange::BubbleRemoved(id.to_string()));
        Ok(removed)
    }

    pub fn clear_bubbles(&mut self) {
        self.data.bubbles.clear();
        debug!("bubbles cleared");
        self.notify(StoreChange::BubblesCleared);
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub fn add_comment(&mut self, comment: Comment) -> Result<()> {
        if self.comment(&comment.id).is_some() {
            return Err(AnnotationError::DuplicateId(comment.id));
        }
        comment.validate()?;
        let id = comment.id.clone();
        self.data.comments.push(comment);
        debug!(comment_id = %id, "comment added");
        self.notify(StoreChange::CommentAdded(id));
        Ok(())
    }

    pub fn update_comment(&mut self, id: &str, patch: &CommentPatch) -> Result<()> {
        let index = self
            .data
            .comments
            .iter()
            .position(|comment| comment.id == id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_string()))?;

        let mut merged = self.data.comments[index].clone();
        patch.apply_to(&mut merged);
        merged.validate()?;

        if merged == self.data.comments[index] {
            return Ok(());
        }
        self.data.comments[index] = merged;
        debug!(comment_id = %id, "comment updated");
        self.notify(StoreChange::CommentUpdated(id.to_string()));
        Ok(())
    }

    pub fn delete_comment(&mut self, id: &str) -> Result<Comment> {
        let index = self
            .data
            .comments
            .iter()
            .position(|comment| comment.id == id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_string()))?;
        let removed = self.data.comments.remove(index);
        debug!(comment_id = %id, "comment deleted");
        self.notify(StoreChange::CommentRemoved(id.to_string()));
        Ok(removed)
    }

    pub fn clear_comments(&mut self) {
        self.data.comments.clear();
        debug!("comments cleared");
        self.notify(StoreChange::CommentsCleared);
    }

    // =========================================================================
    // Bulk
    // =========================================================================

    /// Empty both collections (audio unloaded or replaced).
    pub fn clear(&mut self) {
        self.clear_bubbles();
        self.clear_comments();
    }

    /// Swap in a whole new set. Destructive; callers confirm first.
    pub fn replace_all(&mut self, set: AnnotationSet) -> Result<()> {
        set.validate()?;
        self.data = set;
        debug!(
            bubbles = self.data.bubbles.len(),
            comments = self.data.comments.len(),
            "annotation set replaced"
        );
        self.notify(StoreChange::Replaced);
        Ok(())
    }

    /// Append every record of `set`. Fails with `DuplicateId` on the first
    /// imported id already present, writing nothing.
    pub fn extend(&mut self, set: AnnotationSet) -> Result<()> {
        set.validate()?;
        if let Some(bubble) = set.bubbles.iter().find(|bubble| self.bubble(&bubble.id).is_some()) {
            return Err(AnnotationError::DuplicateId(bubble.id.clone()));
        }
        if let Some(comment) = set.comments.iter().find(|comment| self.comment(&comment.id).is_some()) {
            return Err(AnnotationError::DuplicateId(comment.id.clone()));
        }

        let change = StoreChange::Merged {
            bubbles: set.bubbles.len(),
            comments: set.comments.len(),
        };
        self.data.bubbles.extend(set.bubbles);
        self.data.comments.extend(set.comments);
        debug!(?change, "annotation set merged");
        self.notify(change);
        Ok(())
    }
}
