//! Coalesces projection requests to at most one per display frame.
//!
//! Scroll, zoom and resize can fire many times between frames. Each request
//! replaces the pending one, so the render loop only ever sees the latest.

use tokio::sync::watch;

use crate::core::viewport::VisibleWindow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRequest {
    pub window: VisibleWindow,
    pub pixel_width: f64,
    /// Increases with every request; gaps mean requests were coalesced.
    pub sequence: u64,
}

/// Producer half, held by whatever observes scroll/zoom/resize.
#[derive(Debug)]
pub struct FrameScheduler {
    sender: watch::Sender<Option<FrameRequest>>,
    sequence: u64,
}

/// Consumer half, held by the render loop.
#[derive(Debug)]
pub struct FrameReceiver {
    receiver: watch::Receiver<Option<FrameRequest>>,
}

pub fn frame_channel() -> (FrameScheduler, FrameReceiver) {
    let (sender, receiver) = watch::channel(None);
    (FrameScheduler { sender, sequence: 0 }, FrameReceiver { receiver })
}

impl FrameScheduler {
    /// Queue a projection, replacing any request not yet picked up.
    pub fn request(&mut self, window: VisibleWindow, pixel_width: f64) -> u64 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sender.send_replace(Some(FrameRequest {
            window,
            pixel_width,
            sequence: self.sequence,
        }));
        self.sequence
    }

    pub fn last_sequence(&self) -> u64 {
        self.sequence
    }
}

impl FrameReceiver {
    /// Wait for the next frame. `None` once the scheduler is dropped.
    pub async fn next_frame(&mut self) -> Option<FrameRequest> {
        self.receiver.changed().await.ok()?;
        *self.receiver.borrow_and_update()
    }

    /// The pending request, if one arrived since the last frame.
    pub fn take_pending(&mut self) -> Option<FrameRequest> {
        if !self.receiver.has_changed().unwrap_or(false) {
            return None;
        }
        *self.receiver.borrow_and_update()
    }
}
