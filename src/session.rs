//! Presentation-facing facade over the store, the region bridge and the
//! waveform collaborator.
//!
//! The host forwards collaborator events (audio ready, playback position,
//! region drags) into the session and reads geometry back out of it.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::projection::{self, BubbleGeometry, CommentGeometry};
use crate::core::region_sync::{RegionSyncBridge, RegionSyncState};
use crate::core::viewport::VisibleWindow;
use crate::core::waveform::{RegionEvent, WaveformSurface};
use crate::error::{AnnotationError, FieldError, Result};
use crate::state::{
    parse_document, AnnotationSet, AnnotationStore, Bubble, BubbleDraft, BubblePatch, Comment, CommentPatch,
    EngineSettings, MarkCapture, SelectionState, StoreChange, SubscriptionId,
};

/// A validated document waiting for the user to confirm replacing the
/// current, non-empty annotation set.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImport {
    set: AnnotationSet,
}

impl PendingImport {
    pub fn bubble_count(&self) -> usize {
        self.set.bubbles.len()
    }

    pub fn comment_count(&self) -> usize {
        self.set.comments.len()
    }

    pub fn set(&self) -> &AnnotationSet {
        &self.set
    }

    pub fn into_set(self) -> AnnotationSet {
        self.set
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// The store was empty and now holds the document.
    Imported { bubbles: usize, comments: usize },
    /// The store already has data; confirm to replace or merge instead.
    ConfirmReplace(PendingImport),
}

pub struct AnnotationSession<S: WaveformSurface> {
    surface: S,
    store: AnnotationStore,
    bridge: RegionSyncBridge,
    selection: SelectionState,
    marks: MarkCapture,
    settings: EngineSettings,
    audio_duration: Option<f64>,
    playback_position: f64,
}

impl<S: WaveformSurface> AnnotationSession<S> {
    pub fn new(surface: S, settings: EngineSettings) -> Self {
        let bridge = RegionSyncBridge::new(settings.region_opacity());
        Self {
            surface,
            store: AnnotationStore::default(),
            bridge,
            selection: SelectionState::default(),
            marks: MarkCapture::default(),
            settings,
            audio_duration: None,
            playback_position: 0.0,
        }
    }

    /// Start from an existing annotation set (e.g. restored by the host).
    pub fn with_annotations(surface: S, settings: EngineSettings, initial: AnnotationSet) -> Result<Self> {
        let mut session = Self::new(surface, settings);
        session.store = AnnotationStore::new(initial)?;
        Ok(session)
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn region_state(&self) -> &RegionSyncState {
        self.bridge.state()
    }

    pub fn audio_duration(&self) -> Option<f64> {
        self.audio_duration
    }

    pub fn is_audio_loaded(&self) -> bool {
        self.audio_duration.is_some()
    }

    pub fn playback_position(&self) -> f64 {
        self.playback_position
    }

    pub fn pending_mark(&self) -> Option<f64> {
        self.marks.pending_start()
    }

    // =========================================================================
    // Audio lifecycle
    // =========================================================================

    /// The collaborator finished decoding new audio. Previous annotations
    /// belong to the previous file and are dropped.
    pub fn load_audio(&mut self, duration_seconds: f64) -> Result<()> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(AnnotationError::ValidationFailed(vec![FieldError::new(
                "duration",
                "audio duration must be a positive number of seconds",
            )]));
        }
        self.reset_annotations();
        self.audio_duration = Some(duration_seconds);
        self.playback_position = 0.0;
        self.bridge.attach(&mut self.surface);
        info!(duration_seconds, "audio loaded");
        Ok(())
    }

    /// Clear every record, drop the region and release collaborator listeners.
    pub fn unload_audio(&mut self) {
        self.reset_annotations();
        self.bridge.detach(&mut self.surface);
        self.audio_duration = None;
        self.playback_position = 0.0;
        info!("audio unloaded");
    }

    /// Drop every record together with anything that points at one: the
    /// selection, a pending mark and the materialized region.
    fn reset_annotations(&mut self) {
        if !self.store.is_empty() {
            self.store.clear();
        }
        self.selection.clear();
        self.marks.cancel();
        self.bridge.release(&mut self.surface);
    }

    pub fn set_playback_position(&mut self, position_seconds: f64) {
        let position = if position_seconds.is_finite() { position_seconds.max(0.0) } else { 0.0 };
        self.playback_position = match self.audio_duration {
            Some(duration) => position.min(duration),
            None => position,
        };
    }

    // =========================================================================
    // Creating records
    // =========================================================================

    pub fn mark_start(&mut self) -> Result<()> {
        self.marks.mark_start(self.playback_position)?;
        debug!(position = self.playback_position, "mark start");
        Ok(())
    }

    /// Close the pending mark at the playback position and store the bubble.
    pub fn mark_end(&mut self, draft: BubbleDraft) -> Result<String> {
        let bubble = self
            .marks
            .mark_end(self.playback_position, draft, &self.settings.default_color)?;
        let id = bubble.id.clone();
        self.store.add_bubble(bubble)?;
        info!(bubble_id = %id, "bubble marked");
        Ok(id)
    }

    /// Add an empty table row on `layer` with the default color.
    pub fn create_bubble_row(&mut self, layer: u8) -> Result<String> {
        let bubble = Bubble::row(layer, self.settings.default_color.clone());
        let id = bubble.id.clone();
        self.store.add_bubble(bubble)?;
        Ok(id)
    }

    pub fn create_comment(&mut self, start_seconds: f64, end_seconds: f64, text: &str) -> Result<String> {
        let comment = Comment::new(start_seconds, end_seconds, text);
        let id = comment.id.clone();
        self.store.add_comment(comment)?;
        Ok(id)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select a bubble and materialize its region.
    pub fn select_bubble(&mut self, id: &str) -> Result<()> {
        if self.store.bubble(id).is_none() {
            return Err(AnnotationError::NotFound(id.to_string()));
        }
        self.selection.select_bubble(id);
        self.bridge.select(&self.store, &mut self.surface, Some(id));
        Ok(())
    }

    pub fn select_comment(&mut self, id: &str) -> Result<()> {
        if self.store.comment(id).is_none() {
            return Err(AnnotationError::NotFound(id.to_string()));
        }
        self.selection.select_comment(id);
        self.bridge.select(&self.store, &mut self.surface, None);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.bridge.select(&self.store, &mut self.surface, None);
    }

    // =========================================================================
    // Table edits
    // =========================================================================

    pub fn update_bubble(&mut self, id: &str, patch: &BubblePatch) -> Result<()> {
        self.store.update_bubble(id, patch)?;
        let change = StoreChange::BubbleUpdated(id.to_string());
        self.bridge.on_store_change(&self.store, &mut self.surface, &change);
        // A selected row that just became complete gets its region now.
        if self.selection.primary_bubble() == Some(id) && self.bridge.state() == &RegionSyncState::Empty {
            self.bridge.select(&self.store, &mut self.surface, Some(id));
        }
        Ok(())
    }

    pub fn delete_bubble(&mut self, id: &str) -> Result<Bubble> {
        let removed = self.store.delete_bubble(id)?;
        self.selection.remove_bubble(id);
        let change = StoreChange::BubbleRemoved(id.to_string());
        self.bridge.on_store_change(&self.store, &mut self.surface, &change);
        Ok(removed)
    }

    pub fn update_comment(&mut self, id: &str, patch: &CommentPatch) -> Result<()> {
        self.store.update_comment(id, patch)
    }

    pub fn delete_comment(&mut self, id: &str) -> Result<Comment> {
        let removed = self.store.delete_comment(id)?;
        self.selection.remove_comment(id);
        Ok(removed)
    }

    // =========================================================================
    // Collaborator events
    // =========================================================================

    pub fn handle_region_event(&mut self, event: &RegionEvent) {
        self.bridge.handle_event(&mut self.store, &mut self.surface, event);
        if let Some(selected) = self.selection.primary_bubble().map(str::to_string) {
            if self.store.bubble(&selected).is_none() {
                self.selection.remove_bubble(&selected);
            }
        }
    }

    /// Time range currently on screen, from the collaborator's scroll and zoom.
    pub fn visible_window(&self) -> VisibleWindow {
        let duration = self.audio_duration.unwrap_or_else(|| self.surface.duration_seconds());
        VisibleWindow::from_scroll(
            self.surface.scroll_px(),
            self.surface.zoom_px_per_second(),
            self.surface.viewport_width_px(),
            duration,
        )
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub fn project(&self, window: VisibleWindow, pixel_width: f64) -> Vec<BubbleGeometry> {
        projection::project(self.store.bubbles(), window, pixel_width, &self.settings.layout())
    }

    pub fn project_comments(&self, window: VisibleWindow, pixel_width: f64) -> Vec<CommentGeometry> {
        projection::project_comments(
            self.store.comments(),
            window,
            pixel_width,
            self.settings.layout().min_width,
        )
    }

    /// Geometry for whatever the collaborator is showing right now.
    pub fn project_visible(&self) -> (Vec<BubbleGeometry>, Vec<CommentGeometry>) {
        let window = self.visible_window();
        let width = self.surface.viewport_width_px();
        (self.project(window, width), self.project_comments(window, width))
    }

    // =========================================================================
    // Export/Import
    // =========================================================================

    pub fn export_json(&self) -> Result<String> {
        self.store.export_json()
    }

    pub fn export_to_file(&self, path: &Path) -> Result<PathBuf> {
        self.store.export_to_file(path)
    }

    /// Parse a document. An empty store takes it directly; otherwise the
    /// caller must confirm (replace) or merge.
    pub fn import_json(&mut self, text: &str) -> Result<ImportOutcome> {
        let set = parse_document(text)?;
        self.stage_import(set)
    }

    pub fn import_from_file(&mut self, path: &Path) -> Result<ImportOutcome> {
        let set = AnnotationStore::read_document(path)?;
        self.stage_import(set)
    }

    /// Replace everything with the pending document.
    pub fn confirm_import(&mut self, pending: PendingImport) -> Result<()> {
        self.store.replace_all(pending.into_set())?;
        self.selection.clear();
        self.bridge.release(&mut self.surface);
        info!(
            bubbles = self.store.bubbles().len(),
            comments = self.store.comments().len(),
            "annotations replaced by import"
        );
        Ok(())
    }

    /// Append the pending document. Fails without changes on a repeated id.
    pub fn merge_import(&mut self, pending: PendingImport) -> Result<()> {
        let (bubbles, comments) = (pending.bubble_count(), pending.comment_count());
        self.store.extend(pending.into_set())?;
        info!(bubbles, comments, "annotations merged from import");
        Ok(())
    }

    fn stage_import(&mut self, set: AnnotationSet) -> Result<ImportOutcome> {
        if !self.store.is_empty() {
            debug!("store not empty, import needs confirmation");
            return Ok(ImportOutcome::ConfirmReplace(PendingImport { set }));
        }
        let outcome = ImportOutcome::Imported {
            bubbles: set.bubbles.len(),
            comments: set.comments.len(),
        };
        self.store.replace_all(set)?;
        info!(?outcome, "annotations imported");
        Ok(outcome)
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn on_store_change(&mut self, listener: impl FnMut(&StoreChange, &AnnotationSet) + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

impl<S: WaveformSurface> Drop for AnnotationSession<S> {
    fn drop(&mut self) {
        self.bridge.detach(&mut self.surface);
    }
}
