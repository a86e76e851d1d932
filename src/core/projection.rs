//! Time-to-pixel projection of annotations for the visible window.
//!
//! `project` is pure: the same records, window and width always produce the
//! same geometry, so it can run on every scroll/zoom/resize tick.

use crate::constants::{DEFAULT_LAYER_UNIT_HEIGHT, DEFAULT_MIN_BUBBLE_WIDTH_PX, MAX_LAYER, MIN_LAYER};
use crate::core::time_code;
use crate::core::viewport::VisibleWindow;
use crate::state::{Bubble, Comment};

/// Pixel sizing used by the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionLayout {
    /// Height of one layer step; a bubble is `layer * layer_unit_height` tall.
    pub layer_unit_height: f64,
    /// Narrowest a visible record is drawn.
    pub min_width: f64,
}

impl Default for ProjectionLayout {
    fn default() -> Self {
        Self {
            layer_unit_height: DEFAULT_LAYER_UNIT_HEIGHT,
            min_width: DEFAULT_MIN_BUBBLE_WIDTH_PX,
        }
    }
}

/// Screen rectangle for one bubble, keyed by its id.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleGeometry {
    pub id: String,
    pub x: f64,
    pub width: f64,
    pub height: f64,
    /// Higher draws on top. Layer 1 gets the highest value.
    pub z_order: u8,
    pub layer: u8,
    /// Resolved display color
    pub color: String,
    pub label: String,
}

/// Horizontal extent of one comment in the comment lane.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentGeometry {
    pub id: String,
    pub x: f64,
    pub width: f64,
}

/// Project bubbles into geometry for `window` rendered `pixel_width` wide.
///
/// Records that cannot be drawn (unparsable times, start >= stop, layer out of
/// range, entirely off screen) are left out. Output follows input order.
pub fn project(
    bubbles: &[Bubble],
    window: VisibleWindow,
    pixel_width: f64,
    layout: &ProjectionLayout,
) -> Vec<BubbleGeometry> {
    let Some(scale) = scale_for(window, pixel_width) else {
        return Vec::new();
    };

    bubbles
        .iter()
        .filter_map(|bubble| {
            if !(MIN_LAYER..=MAX_LAYER).contains(&bubble.layer) {
                return None;
            }
            let start_ms = time_code::millis_or_zero(bubble.start_time.as_str()).ok()?;
            let stop_ms = time_code::millis_or_zero(bubble.stop_time.as_str()).ok()?;
            if start_ms >= stop_ms {
                return None;
            }

            let (x, width) = clip_span(start_ms as f64, stop_ms as f64, window, scale, pixel_width, layout.min_width)?;
            Some(BubbleGeometry {
                id: bubble.id.clone(),
                x,
                width,
                height: bubble.layer as f64 * layout.layer_unit_height,
                z_order: MAX_LAYER - bubble.layer,
                layer: bubble.layer,
                color: bubble.color.resolve(),
                label: bubble.bubble_name.clone(),
            })
        })
        .collect()
}

/// Project comments onto the comment lane. Point comments (start == end)
/// are drawn at the minimum width.
pub fn project_comments(
    comments: &[Comment],
    window: VisibleWindow,
    pixel_width: f64,
    min_width: f64,
) -> Vec<CommentGeometry> {
    let Some(scale) = scale_for(window, pixel_width) else {
        return Vec::new();
    };

    comments
        .iter()
        .filter_map(|comment| {
            if !comment.start_time.is_finite() || !comment.end_time.is_finite() || comment.start_time > comment.end_time {
                return None;
            }
            let start_ms = comment.start_time * 1000.0;
            let end_ms = comment.end_time * 1000.0;
            let (x, width) = clip_span(start_ms, end_ms, window, scale, pixel_width, min_width)?;
            Some(CommentGeometry {
                id: comment.id.clone(),
                x,
                width,
            })
        })
        .collect()
}

fn scale_for(window: VisibleWindow, pixel_width: f64) -> Option<f64> {
    if !window.is_projectable() || !pixel_width.is_finite() || pixel_width <= 0.0 {
        return None;
    }
    Some(pixel_width / window.span_ms())
}

/// Clip a time span to the viewport. `None` when it lies entirely outside.
///
/// The minimum width never pushes a rectangle past the right edge: it grows
/// leftwards instead, so `0 <= x` and `x + width <= pixel_width` always hold.
fn clip_span(
    start_ms: f64,
    end_ms: f64,
    window: VisibleWindow,
    scale: f64,
    pixel_width: f64,
    min_width: f64,
) -> Option<(f64, f64)> {
    let raw_start_x = (start_ms - window.start_ms) * scale;
    let raw_end_x = (end_ms - window.start_ms) * scale;
    if raw_end_x < 0.0 || raw_start_x > pixel_width {
        return None;
    }

    let x = raw_start_x.max(0.0);
    let end_x = raw_end_x.min(pixel_width);
    let width = (end_x - x).max(min_width.max(0.0)).min(pixel_width);
    let x = x.min(pixel_width - width).max(0.0);
    Some((x, width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::ColorToken;

    fn bubble(id: &str, layer: u8, start: &str, stop: &str) -> Bubble {
        Bubble {
            id: id.to_string(),
            layer,
            bubble_name: id.to_uppercase(),
            start_time: start.into(),
            stop_time: stop.into(),
            color: ColorToken::new("Red"),
        }
    }

    fn layout() -> ProjectionLayout {
        ProjectionLayout {
            layer_unit_height: 40.0,
            min_width: 2.0,
        }
    }

    #[test]
    fn test_layer_one_renders_above_layer_two() {
        let bubbles = vec![
            bubble("front", 1, "00:10:000", "00:20:000"),
            bubble("back", 2, "00:15:000", "00:18:000"),
        ];
        let geometry = project(&bubbles, VisibleWindow::new(0.0, 30_000.0), 300.0, &layout());
        assert_eq!(geometry.len(), 2);

        let front = &geometry[0];
        let back = &geometry[1];
        assert_eq!((front.x, front.width, front.height), (100.0, 100.0, 40.0));
        assert_eq!((back.x, back.width, back.height), (150.0, 30.0, 80.0));
        assert!(front.z_order > back.z_order);
        assert!(front.height < back.height);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let bubbles = vec![
            bubble("a", 3, "00:01:000", "00:04:000"),
            bubble("b", 6, "00:02:500", "01:00:000"),
        ];
        let window = VisibleWindow::new(1_500.0, 9_000.0);
        let first = project(&bubbles, window, 640.0, &layout());
        let second = project(&bubbles, window, 640.0, &layout());
        assert_eq!(first, second);
    }

    #[test]
    fn test_skips_unrenderable_records() {
        let bubbles = vec![
            bubble("reversed", 1, "00:05:000", "00:04:000"),
            bubble("empty", 1, "00:05:000", "00:05:000"),
            bubble("garbage", 1, "abc", "00:04:000"),
            bubble("no-stop", 1, "00:01:000", ""),
            bubble("bad-layer", 7, "00:01:000", "00:02:000"),
        ];
        assert!(project(&bubbles, VisibleWindow::new(0.0, 10_000.0), 100.0, &layout()).is_empty());
    }

    #[test]
    fn test_unset_start_reads_as_zero() {
        let bubbles = vec![bubble("open", 1, "", "00:05:000")];
        let geometry = project(&bubbles, VisibleWindow::new(0.0, 10_000.0), 100.0, &layout());
        assert_eq!(geometry.len(), 1);
        assert_eq!((geometry[0].x, geometry[0].width), (0.0, 50.0));
    }

    #[test]
    fn test_fully_outside_is_dropped() {
        let bubbles = vec![
            bubble("before", 1, "00:01:000", "00:02:000"),
            bubble("after", 1, "00:20:000", "00:25:000"),
        ];
        assert!(project(&bubbles, VisibleWindow::new(5_000.0, 10_000.0), 500.0, &layout()).is_empty());
    }

    #[test]
    fn test_partial_overlap_is_clipped() {
        let bubbles = vec![
            bubble("left", 1, "00:03:000", "00:06:000"),
            bubble("right", 2, "00:09:000", "00:15:000"),
            bubble("spanning", 3, "00:00:000", "00:30:000"),
        ];
        let pixel_width = 500.0;
        let geometry = project(&bubbles, VisibleWindow::new(5_000.0, 10_000.0), pixel_width, &layout());
        assert_eq!(geometry.len(), 3);
        for rect in &geometry {
            assert!(rect.x >= 0.0 && rect.x <= pixel_width, "{rect:?}");
            assert!(rect.x + rect.width <= pixel_width, "{rect:?}");
        }
        assert_eq!((geometry[0].x, geometry[0].width), (0.0, 100.0));
        assert_eq!((geometry[1].x, geometry[1].width), (400.0, 100.0));
        assert_eq!((geometry[2].x, geometry[2].width), (0.0, pixel_width));
    }

    #[test]
    fn test_minimum_width_stays_inside_viewport() {
        let bubbles = vec![
            bubble("sliver", 1, "00:05:000", "00:05:001"),
            bubble("edge", 1, "00:10:000", "00:10:001"),
        ];
        let geometry = project(&bubbles, VisibleWindow::new(0.0, 10_000.0), 100.0, &layout());
        assert_eq!(geometry.len(), 2);
        assert_eq!(geometry[0].width, 2.0);
        assert_eq!((geometry[1].x, geometry[1].width), (98.0, 2.0));
    }

    #[test]
    fn test_degenerate_viewport_yields_nothing() {
        let bubbles = vec![bubble("a", 1, "00:01:000", "00:02:000")];
        assert!(project(&bubbles, VisibleWindow::new(0.0, 0.0), 100.0, &layout()).is_empty());
        assert!(project(&bubbles, VisibleWindow::new(0.0, 10_000.0), 0.0, &layout()).is_empty());
        assert!(project(&bubbles, VisibleWindow::new(0.0, 10_000.0), f64::NAN, &layout()).is_empty());
    }

    #[test]
    fn test_output_keeps_input_order_and_colors() {
        let mut blue = bubble("second", 4, "00:01:000", "00:02:000");
        blue.color = ColorToken::new("#0000ff");
        let bubbles = vec![bubble("first", 6, "00:03:000", "00:04:000"), blue];
        let geometry = project(&bubbles, VisibleWindow::new(0.0, 10_000.0), 100.0, &layout());
        let ids: Vec<&str> = geometry.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(geometry[0].z_order, 0);
        assert_eq!(geometry[1].color, "#0000ff");
    }

    #[test]
    fn test_comment_lane_projection() {
        let comments = vec![
            Comment {
                id: "range".to_string(),
                start_time: 1.0,
                end_time: 3.0,
                text: "a".to_string(),
            },
            Comment {
                id: "point".to_string(),
                start_time: 5.0,
                end_time: 5.0,
                text: "b".to_string(),
            },
            Comment {
                id: "offscreen".to_string(),
                start_time: 20.0,
                end_time: 21.0,
                text: "c".to_string(),
            },
        ];
        let geometry = project_comments(&comments, VisibleWindow::new(0.0, 10_000.0), 100.0, 2.0);
        assert_eq!(
            geometry,
            vec![
                CommentGeometry { id: "range".to_string(), x: 10.0, width: 20.0 },
                CommentGeometry { id: "point".to_string(), x: 50.0, width: 2.0 },
            ]
        );
    }
}
