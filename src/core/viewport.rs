use serde::{Deserialize, Serialize};

/// Lowest zoom accepted before falling back to fit-to-width.
const MIN_ZOOM_PX_PER_SECOND: f64 = 0.1;

/// The time range currently on screen, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl VisibleWindow {
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn from_seconds(start_seconds: f64, end_seconds: f64) -> Self {
        Self::new(start_seconds * 1000.0, end_seconds * 1000.0)
    }

    pub fn span_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    /// Whether the window can be projected at all (finite, positive span).
    pub fn is_projectable(&self) -> bool {
        self.start_ms.is_finite() && self.end_ms.is_finite() && self.span_ms() > 0.0
    }

    /// Derive the window from the waveform's scroll position and zoom.
    ///
    /// A zoom at or below the floor means the waveform is fitted to its
    /// width, so the whole duration is visible. The result never extends
    /// past `[0, duration]` when the duration is known.
    pub fn from_scroll(scroll_px: f64, px_per_second: f64, viewport_width_px: f64, duration_seconds: f64) -> Self {
        let duration = if duration_seconds.is_finite() { duration_seconds.max(0.0) } else { 0.0 };
        let width = if viewport_width_px.is_finite() { viewport_width_px.max(0.0) } else { 0.0 };

        let zoom = if px_per_second.is_finite() && px_per_second > MIN_ZOOM_PX_PER_SECOND {
            px_per_second
        } else {
            fit_zoom(duration, width)
        };
        if zoom <= 0.0 {
            return Self::from_seconds(0.0, duration);
        }

        let scroll = if scroll_px.is_finite() { scroll_px.max(0.0) } else { 0.0 };
        let mut start = scroll / zoom;
        let mut end = start + width / zoom;
        if duration > 0.0 {
            end = end.min(duration);
            start = start.min(end);
        }
        Self::from_seconds(start, end)
    }
}

/// Zoom (px per second) at which `duration` exactly fills `viewport_width_px`.
pub fn fit_zoom(duration_seconds: f64, viewport_width_px: f64) -> f64 {
    if duration_seconds <= 0.0 || viewport_width_px <= 0.0 {
        return 0.0;
    }
    viewport_width_px / duration_seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_and_zoom_map_to_window() {
        let window = VisibleWindow::from_scroll(200.0, 100.0, 500.0, 60.0);
        assert_eq!(window, VisibleWindow::new(2_000.0, 7_000.0));
    }

    #[test]
    fn test_window_is_clamped_to_duration() {
        let window = VisibleWindow::from_scroll(5_000.0, 100.0, 1_000.0, 55.0);
        assert_eq!(window.end_ms, 55_000.0);
        assert!(window.start_ms <= window.end_ms);
    }

    #[test]
    fn test_zero_zoom_fits_duration() {
        let window = VisibleWindow::from_scroll(0.0, 0.0, 800.0, 40.0);
        assert_eq!(window, VisibleWindow::new(0.0, 40_000.0));
    }

    #[test]
    fn test_projectable() {
        assert!(VisibleWindow::new(0.0, 1.0).is_projectable());
        assert!(!VisibleWindow::new(5.0, 5.0).is_projectable());
        assert!(!VisibleWindow::new(f64::NAN, 5.0).is_projectable());
    }
}
