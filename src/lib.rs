//! Bubblemachine
//!
//! Timeline annotation engine for audio files: layered time-range "bubbles",
//! time-anchored comments, the projection of both onto a scrolling waveform
//! viewport, and two-way sync with the waveform's draggable regions.

pub mod constants;
pub mod core;
pub mod error;
pub mod session;
pub mod state;

pub use crate::core::color::ColorToken;
pub use crate::core::frame_scheduler::{frame_channel, FrameReceiver, FrameRequest, FrameScheduler};
pub use crate::core::projection::{project, project_comments, BubbleGeometry, CommentGeometry, ProjectionLayout};
pub use crate::core::region_sync::{RegionSyncBridge, RegionSyncState};
pub use crate::core::time_code::TimeCode;
pub use crate::core::viewport::VisibleWindow;
pub use crate::core::waveform::{RegionEvent, RegionSpec, WaveformEventKind, WaveformSurface};
pub use error::{AnnotationError, FieldError, Result};
pub use session::{AnnotationSession, ImportOutcome, PendingImport};
pub use state::*;
