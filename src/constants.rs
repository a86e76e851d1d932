//! Shared engine constants: layer limits, layout defaults, and the named color palette.

/// Lowest layer number (frontmost).
pub const MIN_LAYER: u8 = 1;
/// Highest layer number (backmost, tallest).
pub const MAX_LAYER: u8 = 6;

pub const LAYER_UNIT_HEIGHT_MIN: f64 = 40.0;
pub const LAYER_UNIT_HEIGHT_MAX: f64 = 50.0;
pub const DEFAULT_LAYER_UNIT_HEIGHT: f64 = 45.0;
pub const DEFAULT_MIN_BUBBLE_WIDTH_PX: f64 = 2.0;
pub const DEFAULT_REGION_OPACITY: f64 = 0.3;
pub const DEFAULT_BUBBLE_COLOR: &str = "Blue";

/// Upper bound on comment text, in characters.
pub const COMMENT_MAX_CHARS: usize = 2000;

/// File name used when exporting into a directory.
pub const EXPORT_FILE_NAME: &str = "bubblemachine-data.json";

pub const SETTINGS_FILE_NAME: &str = "settings.json";

// =============================================================================
// COLOR PALETTE
// =============================================================================
pub const PALETTE_RED: &str = "#ef4444";
pub const PALETTE_GREEN: &str = "#22c55e";
pub const PALETTE_BLUE: &str = "#3b82f6";
pub const PALETTE_YELLOW: &str = "#eab308";
pub const PALETTE_PURPLE: &str = "#a855f7";
pub const PALETTE_ORANGE: &str = "#f97316";
pub const PALETTE_PINK: &str = "#ec4899";
pub const PALETTE_BROWN: &str = "#92400e";
pub const PALETTE_GRAY: &str = "#71717a";
pub const PALETTE_WHITE: &str = "#fafafa";
pub const PALETTE_BLACK: &str = "#09090b";
