//! Annotation data model
//!
//! This module contains the canonical annotation records and their store:
//! - Bubble: layered time-range annotation
//! - Comment: time-anchored note
//! - AnnotationStore: the single source of truth, with change subscriptions
//! - Persistence: JSON export/import

mod bubble;
mod comment;
mod persistence;
mod store;

pub use bubble::{Bubble, BubblePatch};
pub use comment::{Comment, CommentPatch};
pub use persistence::{document_path, export_document, parse_document};
pub use store::{AnnotationSet, AnnotationStore, StoreChange, SubscriptionId};
