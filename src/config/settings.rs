//! Playback settings
//!
//! Settings that shape how an animation is played rather than what it
//! shows. They live in a small TOML file:
//!
//! ```toml
//! step_delay_ms = 300
//! max_trace_events = 50000
//!
//! [viewport]
//! width = 1024.0
//! height = 480.0
//! ```
//!
//! Every field is optional.

use crate::animation::DEFAULT_STEP_DELAY_MS;
use crate::error::{AlgoVizError, Result};
use crate::scripting::MAX_TRACE_EVENTS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Playback settings file name
pub const SETTINGS_FILE: &str = "algoviz.toml";

/// Size of the drawing area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    #[serde(default = "default_viewport_width")]
    pub width: f64,
    #[serde(default = "default_viewport_height")]
    pub height: f64,
}

fn default_viewport_width() -> f64 {
    800.0
}

fn default_viewport_height() -> f64 {
    400.0
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

/// Settings for playing animations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Delay between two steps in milliseconds
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Drawing area the layout centers nodes in
    #[serde(default)]
    pub viewport: ViewportSettings,

    /// Maximum events a single run may record
    #[serde(default = "default_max_trace_events")]
    pub max_trace_events: usize,
}

fn default_step_delay_ms() -> u64 {
    DEFAULT_STEP_DELAY_MS
}

fn default_max_trace_events() -> usize {
    MAX_TRACE_EVENTS
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            viewport: ViewportSettings::default(),
            max_trace_events: MAX_TRACE_EVENTS,
        }
    }
}

impl PlaybackSettings {
    /// Step delay as a duration
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Parse settings from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AlgoVizError::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Serialize settings to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AlgoVizError::Serialization(format!("Failed to serialize settings: {}", e)))
    }

    /// Load settings from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AlgoVizError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Load settings, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load playback settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml()?).map_err(|e| {
            AlgoVizError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }
}
