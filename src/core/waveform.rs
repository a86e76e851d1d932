//! The waveform collaborator, as seen by the engine.
//!
//! Decoding, drawing, zoom/scroll and drag gestures all live behind this
//! trait. Any waveform component that can host draggable regions, report its
//! viewport and register/unregister listeners can be plugged in.

/// Handle for a registered collaborator listener.
pub type ListenerId = u64;

/// Collaborator event streams the engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveformEventKind {
    /// Continuous region drag/resize updates
    RegionUpdated,
    /// Fired once when a drag/resize settles
    RegionUpdateEnd,
    Scroll,
    Zoom,
}

/// A draggable region to materialize on the waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    /// Region id; always the id of the bubble it represents
    pub id: String,
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    /// Fill color (opacity already applied)
    pub color: String,
    pub drag: bool,
    pub resize: bool,
}

/// Region lifecycle events forwarded from the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionEvent {
    /// The region moved or was resized (high frequency while dragging).
    Updated { region_id: String, start: f64, end: f64 },
    /// The drag/resize gesture finished.
    UpdateEnd { region_id: String },
}

impl RegionEvent {
    pub fn region_id(&self) -> &str {
        match self {
            RegionEvent::Updated { region_id, .. } | RegionEvent::UpdateEnd { region_id } => region_id,
        }
    }
}

pub trait WaveformSurface {
    fn add_region(&mut self, region: RegionSpec);
    fn clear_regions(&mut self);
    fn regions(&self) -> Vec<RegionSpec>;

    fn subscribe(&mut self, kind: WaveformEventKind) -> ListenerId;
    fn unsubscribe(&mut self, listener: ListenerId);

    /// Horizontal scroll offset in pixels.
    fn scroll_px(&self) -> f64;
    /// Current zoom in pixels per second (0 when fitted to width).
    fn zoom_px_per_second(&self) -> f64;
    /// Loaded audio duration in seconds.
    fn duration_seconds(&self) -> f64;
    fn viewport_width_px(&self) -> f64;
}
