//! Editor settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::snap::DEFAULT_TOLERANCE;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snap settings for line placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapSettings {
    /// Enable snapping
    pub enabled: bool,
    /// Snap radius in world units (strict: a point exactly this far away is not snapped)
    pub tolerance: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// How highlighted parts are emphasised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightStrategy {
    /// Swap the material color, restoring the cached original afterwards
    #[default]
    ColorSwap,
    /// Attach a wireframe overlay per part
    Wireframe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightSettings {
    pub strategy: HighlightStrategy,
    /// Selection color, linear RGB
    pub selection_color: [f32; 3],
    /// Hover color, linear RGB
    pub hover_color: [f32; 3],
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            strategy: HighlightStrategy::default(),
            // #00008B
            selection_color: [0.0, 0.0, 0.545],
            hover_color: [0.3, 0.6, 1.0],
        }
    }
}

/// Annotation display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSettings {
    /// Marker sphere radius
    pub marker_radius: f32,
    pub line_width: f32,
    pub point_color: [f32; 3],
    pub line_color: [f32; 3],
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            marker_radius: 0.05,
            line_width: 2.0,
            point_color: [1.0, 0.0, 0.0],
            line_color: [1.0, 1.0, 0.0],
        }
    }
}

/// Sizes and colors of toolbar primitives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveSettings {
    pub plane_size: [f32; 2],
    pub box_size: [f32; 3],
    pub plane_color: [f32; 3],
    pub box_color: [f32; 3],
}

impl Default for PrimitiveSettings {
    fn default() -> Self {
        Self {
            plane_size: [10.0, 10.0],
            box_size: [1.0, 1.0, 1.0],
            plane_color: [0.83, 0.83, 0.83],
            box_color: [1.0, 0.65, 0.0],
        }
    }
}

/// All editor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorSettings {
    #[serde(default)]
    pub snap: SnapSettings,
    #[serde(default)]
    pub highlight: HighlightSettings,
    #[serde(default)]
    pub annotations: AnnotationSettings,
    #[serde(default)]
    pub primitives: PrimitiveSettings,
}

impl EditorSettings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "markup3d", "markup3d")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from the default location, or return defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_or_default(&path),
            _ => Self::default(),
        }
    }

    /// Load from `path`, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            warn!("Using default settings, failed to load {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save settings to the default location
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            warn!("Failed to save settings to {}: {e}", path.display());
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Effective snap radius (zero when snapping is off)
    pub fn snap_tolerance(&self) -> f32 {
        if self.snap.enabled {
            self.snap.tolerance
        } else {
            0.0
        }
    }
}
