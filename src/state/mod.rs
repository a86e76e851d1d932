//! State management module
//!
//! This module contains the core data structures of the annotation engine:
//! - Annotations: bubbles, comments, and the store that owns them
//! - Selection: which record is being edited
//! - Marking: mark-start / mark-end capture
//! - Settings: layout and region configuration

mod annotations;
mod marking;
mod selection;
mod settings;

pub use annotations::*;
pub use marking::*;
pub use selection::*;
pub use settings::*;
