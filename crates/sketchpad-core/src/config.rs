//! Editor and export configuration.
//!
//! Every field has a default, so a config file only needs to name the
//! values it changes.

use crate::camera::{Camera, DEFAULT_CANVAS_SIZE, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use crate::gesture::{DEFAULT_DOUBLE_TAP_MS, DEFAULT_TAP_SLOP, TapArbiter};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// US Letter, in points.
pub const DEFAULT_PAGE_WIDTH: f64 = 8.5 * 72.0;
pub const DEFAULT_PAGE_HEIGHT: f64 = 11.0 * 72.0;

/// Side of the square placed by a single tap.
pub const DEFAULT_SHAPE_SIZE: f64 = 100.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum time between the taps of a double tap, in milliseconds.
    pub double_tap_ms: u64,
    /// Maximum distance between the taps of a double tap.
    pub tap_slop: f64,
    /// Side of the square created by a single tap.
    pub new_shape_size: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub export: ExportConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            double_tap_ms: DEFAULT_DOUBLE_TAP_MS,
            tap_slop: DEFAULT_TAP_SLOP,
            new_shape_size: DEFAULT_SHAPE_SIZE,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
            export: ExportConfig::default(),
        }
    }
}

/// Settings for the paginated export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub page_width: f64,
    pub page_height: f64,
    /// Optional heading drawn at the top of the page.
    pub heading: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
            heading: None,
            title: None,
            author: None,
            creator: "sketchpad".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms)
    }

    /// Tap arbiter configured with this session's timing.
    pub fn tap_arbiter(&self) -> TapArbiter {
        TapArbiter::new(self.double_tap_window(), self.tap_slop)
    }

    /// Camera configured with this session's zoom limits and canvas size.
    pub fn camera(&self) -> Camera {
        Camera::with_limits(
            self.min_zoom,
            self.max_zoom,
            Size::new(self.canvas_width, self.canvas_height),
        )
    }
}
