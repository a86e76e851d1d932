//! Two-way sync between the selected bubble and its waveform region.
//!
//! Only the selected bubble is materialized as a draggable region. The store
//! stays authoritative: drag updates are written into it as they arrive, and
//! once a drag settles the region is forced back onto the store's values.

use tracing::{debug, warn};

use crate::core::time_code::{self, TimeCode};
use crate::core::waveform::{ListenerId, RegionEvent, RegionSpec, WaveformEventKind, WaveformSurface};
use crate::state::{AnnotationStore, Bubble, BubblePatch, StoreChange};

/// State of the single active-region slot.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSyncState {
    /// No region materialized.
    Empty,
    /// Region geometry matches the store.
    Synced { bubble_id: String },
    /// A drag is in progress; the region leads and the store follows.
    Dragging {
        bubble_id: String,
        /// Bounds before the drag, restored if the drag settles on an invalid range.
        origin: (TimeCode, TimeCode),
    },
    /// The drag ended; the store's values are being pushed back to the region.
    Reconciling { bubble_id: String },
}

impl RegionSyncState {
    pub fn bubble_id(&self) -> Option<&str> {
        match self {
            RegionSyncState::Empty => None,
            RegionSyncState::Synced { bubble_id }
            | RegionSyncState::Dragging { bubble_id, .. }
            | RegionSyncState::Reconciling { bubble_id } => Some(bubble_id),
        }
    }
}

#[derive(Debug)]
pub struct RegionSyncBridge {
    state: RegionSyncState,
    listeners: Vec<ListenerId>,
    region_opacity: f64,
}

impl RegionSyncBridge {
    pub fn new(region_opacity: f64) -> Self {
        Self {
            state: RegionSyncState::Empty,
            listeners: Vec::new(),
            region_opacity,
        }
    }

    pub fn state(&self) -> &RegionSyncState {
        &self.state
    }

    pub fn active_bubble(&self) -> Option<&str> {
        self.state.bubble_id()
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Register for region lifecycle events. Calling twice is a no-op.
    pub fn attach<S: WaveformSurface + ?Sized>(&mut self, surface: &mut S) {
        if self.is_attached() {
            return;
        }
        self.listeners.push(surface.subscribe(WaveformEventKind::RegionUpdated));
        self.listeners.push(surface.subscribe(WaveformEventKind::RegionUpdateEnd));
        debug!(listeners = self.listeners.len(), "region bridge attached");
    }

    /// Drop the region and release every listener registered by `attach`.
    pub fn detach<S: WaveformSurface + ?Sized>(&mut self, surface: &mut S) {
        self.release(surface);
        for listener in self.listeners.drain(..) {
            surface.unsubscribe(listener);
        }
        debug!("region bridge detached");
    }

    /// Remove the materialized region, if any, and go back to `Empty`.
    pub fn release<S: WaveformSurface + ?Sized>(&mut self, surface: &mut S) {
        if self.state != RegionSyncState::Empty {
            surface.clear_regions();
            self.state = RegionSyncState::Empty;
        }
    }

    /// Follow a selection change: materialize the newly selected bubble, or
    /// nothing when the selection is cleared.
    ///
    /// A bubble whose bounds are unset or out of order has no region until the
    /// table edit is completed.
    pub fn select<S: WaveformSurface + ?Sized>(&mut self, store: &AnnotationStore, surface: &mut S, bubble_id: Option<&str>) {
        self.release(surface);
        let Some(bubble_id) = bubble_id else {
            return;
        };
        match store.bubble(bubble_id) {
            Some(bubble) => {
                if self.materialize(bubble, surface) {
                    self.state = RegionSyncState::Synced {
                        bubble_id: bubble_id.to_string(),
                    };
                }
            }
            None => debug!(bubble_id, "selected bubble is not in the store"),
        }
    }

    /// Apply one collaborator region event.
    ///
    /// Never fails. Events for the active region drive the drag; if its bubble
    /// was deleted the slot empties. Events for any other region never touch
    /// the active slot.
    pub fn handle_event<S: WaveformSurface + ?Sized>(
        &mut self,
        store: &mut AnnotationStore,
        surface: &mut S,
        event: &RegionEvent,
    ) {
        let region_id = event.region_id();
        if self.active_bubble() != Some(region_id) {
            self.drop_stray_region(store, surface, region_id);
            return;
        }
        if store.bubble(region_id).is_none() {
            warn!(region_id, "active region refers to a deleted bubble, removing it");
            self.release(surface);
            return;
        }

        match event {
            RegionEvent::Updated { start, end, .. } => self.apply_drag(store, region_id, *start, *end),
            RegionEvent::UpdateEnd { .. } => self.reconcile(store, surface, region_id),
        }
    }

    /// A region other than the active one is on the surface: remove it and
    /// put the active region back exactly as the store has it.
    fn drop_stray_region<S: WaveformSurface + ?Sized>(&mut self, store: &AnnotationStore, surface: &mut S, region_id: &str) {
        if !surface.regions().iter().any(|region| region.id == region_id) {
            debug!(region_id, active = ?self.active_bubble(), "ignoring event for inactive region");
            return;
        }
        warn!(region_id, "removing region that is not the active bubble");
        surface.clear_regions();
        let Some(active) = self.active_bubble().map(str::to_string) else {
            return;
        };
        let restored = match store.bubble(&active) {
            Some(bubble) => self.materialize(bubble, surface),
            None => false,
        };
        if !restored {
            self.state = RegionSyncState::Empty;
        }
    }

    /// Keep the region in step with table edits of the active bubble.
    pub fn on_store_change<S: WaveformSurface + ?Sized>(
        &mut self,
        store: &AnnotationStore,
        surface: &mut S,
        change: &StoreChange,
    ) {
        let Some(active) = self.active_bubble().map(str::to_string) else {
            return;
        };
        let relevant = match change {
            StoreChange::BubbleUpdated(id) | StoreChange::BubbleRemoved(id) => *id == active,
            StoreChange::BubblesCleared | StoreChange::Replaced => true,
            _ => false,
        };
        if !relevant {
            return;
        }

        let Some(bubble) = store.bubble(&active) else {
            debug!(bubble_id = %active, "active bubble removed from the store");
            self.release(surface);
            return;
        };
        // A drag in progress keeps its region; update-end reconciles it.
        if matches!(self.state, RegionSyncState::Synced { .. }) && !self.materialize(bubble, surface) {
            self.state = RegionSyncState::Empty;
        }
    }

    fn apply_drag(&mut self, store: &mut AnnotationStore, bubble_id: &str, start: f64, end: f64) {
        if let RegionSyncState::Synced { .. } = self.state {
            let Some(bubble) = store.bubble(bubble_id) else {
                return;
            };
            self.state = RegionSyncState::Dragging {
                bubble_id: bubble_id.to_string(),
                origin: (bubble.start_time.clone(), bubble.stop_time.clone()),
            };
            debug!(bubble_id, "region drag started");
        }

        let patch = BubblePatch::bounds(time_code::format(start), time_code::format(end));
        if let Err(err) = store.update_bubble_interactive(bubble_id, &patch) {
            warn!(bubble_id, error = %err, "drag update rejected");
        }
    }

    fn reconcile<S: WaveformSurface + ?Sized>(&mut self, store: &mut AnnotationStore, surface: &mut S, bubble_id: &str) {
        let origin = match std::mem::replace(
            &mut self.state,
            RegionSyncState::Reconciling {
                bubble_id: bubble_id.to_string(),
            },
        ) {
            RegionSyncState::Dragging { origin, .. } => Some(origin),
            _ => None,
        };

        let settled_valid = store.bubble(bubble_id).map(|bubble| bubble.validate().is_ok()).unwrap_or(false);
        if !settled_valid {
            if let Some((start_time, stop_time)) = origin {
                warn!(bubble_id, "drag settled on an invalid range, restoring previous bounds");
                let patch = BubblePatch::bounds(start_time, stop_time);
                if let Err(err) = store.update_bubble_interactive(bubble_id, &patch) {
                    warn!(bubble_id, error = %err, "could not restore bounds");
                }
            }
        }

        let materialized = match store.bubble(bubble_id) {
            Some(bubble) => self.materialize(bubble, surface),
            None => false,
        };
        if materialized {
            self.state = RegionSyncState::Synced {
                bubble_id: bubble_id.to_string(),
            };
            debug!(bubble_id, "region reconciled with store");
        } else {
            surface.clear_regions();
            self.state = RegionSyncState::Empty;
        }
    }

    /// Put the bubble's region on the surface exactly as the store has it.
    /// Returns false (and leaves no region) when the bubble cannot be drawn.
    fn materialize<S: WaveformSurface + ?Sized>(&self, bubble: &Bubble, surface: &mut S) -> bool {
        let Some(region) = self.region_for(bubble) else {
            surface.clear_regions();
            return false;
        };
        let current = surface.regions();
        if current.len() == 1 && current[0] == region {
            return true;
        }
        surface.clear_regions();
        surface.add_region(region);
        true
    }

    fn region_for(&self, bubble: &Bubble) -> Option<RegionSpec> {
        let (start, end) = bubble.bounds_seconds().ok()?;
        if start >= end {
            return None;
        }
        Some(RegionSpec {
            id: bubble.id.clone(),
            start,
            end,
            color: bubble.color.with_opacity(self.region_opacity),
            drag: true,
            resize: true,
        })
    }
}
