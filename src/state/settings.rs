use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_BUBBLE_COLOR, DEFAULT_LAYER_UNIT_HEIGHT, DEFAULT_MIN_BUBBLE_WIDTH_PX, DEFAULT_REGION_OPACITY,
    LAYER_UNIT_HEIGHT_MAX, LAYER_UNIT_HEIGHT_MIN, SETTINGS_FILE_NAME,
};
use crate::core::color::ColorToken;
use crate::core::projection::ProjectionLayout;
use crate::error::{AnnotationError, Result};

/// Engine-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Height of one layer step in pixels (40 to 50)
    #[serde(default = "default_layer_unit_height")]
    pub layer_unit_height: f64,
    /// Narrowest a visible bubble is drawn, in pixels
    #[serde(default = "default_min_bubble_width_px")]
    pub min_bubble_width_px: f64,
    /// Alpha applied to the selected bubble's region fill
    #[serde(default = "default_region_opacity")]
    pub region_opacity: f64,
    /// Color given to bubbles created without one
    #[serde(default)]
    pub default_color: ColorToken,
}

fn default_layer_unit_height() -> f64 {
    DEFAULT_LAYER_UNIT_HEIGHT
}

fn default_min_bubble_width_px() -> f64 {
    DEFAULT_MIN_BUBBLE_WIDTH_PX
}

fn default_region_opacity() -> f64 {
    DEFAULT_REGION_OPACITY
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            layer_unit_height: default_layer_unit_height(),
            min_bubble_width_px: default_min_bubble_width_px(),
            region_opacity: default_region_opacity(),
            default_color: ColorToken::new(DEFAULT_BUBBLE_COLOR),
        }
    }
}

impl EngineSettings {
    /// Projection layout with out-of-range values pulled back into bounds.
    pub fn layout(&self) -> ProjectionLayout {
        let layer_unit_height = if self.layer_unit_height.is_finite() {
            self.layer_unit_height.clamp(LAYER_UNIT_HEIGHT_MIN, LAYER_UNIT_HEIGHT_MAX)
        } else {
            DEFAULT_LAYER_UNIT_HEIGHT
        };
        let min_width = if self.min_bubble_width_px.is_finite() && self.min_bubble_width_px > 0.0 {
            self.min_bubble_width_px
        } else {
            DEFAULT_MIN_BUBBLE_WIDTH_PX
        };
        ProjectionLayout {
            layer_unit_height,
            min_width,
        }
    }

    pub fn region_opacity(&self) -> f64 {
        if self.region_opacity.is_finite() {
            self.region_opacity.clamp(0.0, 1.0)
        } else {
            DEFAULT_REGION_OPACITY
        }
    }

    /// Load `settings.json` from `folder`; a missing file yields defaults.
    pub fn load(folder: &Path) -> Result<Self> {
        let path = settings_path(folder);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| AnnotationError::InvalidFormat(format!("settings: {}", err)))
    }

    pub fn save(&self, folder: &Path) -> Result<PathBuf> {
        fs::create_dir_all(folder)?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| AnnotationError::InvalidFormat(format!("settings: {}", err)))?;
        let path = settings_path(folder);
        fs::write(&path, json)?;
        Ok(path)
    }
}

fn settings_path(folder: &Path) -> PathBuf {
    folder.join(SETTINGS_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = EngineSettings::from_json(r#"{"layer_unit_height": 42.0}"#).unwrap();
        assert_eq!(settings.layer_unit_height, 42.0);
        assert_eq!(settings.min_bubble_width_px, DEFAULT_MIN_BUBBLE_WIDTH_PX);
        assert_eq!(settings.default_color.as_str(), DEFAULT_BUBBLE_COLOR);
    }

    #[test]
    fn test_layout_clamps_unit_height() {
        let settings = EngineSettings {
            layer_unit_height: 80.0,
            ..Default::default()
        };
        assert_eq!(settings.layout().layer_unit_height, LAYER_UNIT_HEIGHT_MAX);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = std::env::temp_dir().join(format!("bubblemachine-settings-{}", uuid::Uuid::new_v4()));
        assert_eq!(EngineSettings::load(&dir).unwrap(), EngineSettings::default());

        let custom = EngineSettings {
            region_opacity: 0.5,
            ..Default::default()
        };
        custom.save(&dir).unwrap();
        assert_eq!(EngineSettings::load(&dir).unwrap(), custom);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
