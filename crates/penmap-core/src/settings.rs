//! Preference schema for pen gesture mappings
//!
//! Settings are kept in the loosely-typed form the preference store uses:
//! the action selector and hold duration are strings, and unrecognized
//! values degrade to "disabled" / the default duration when the gesture
//! table is rebuilt. Nothing here fails on bad values.

use crate::{GestureKind, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Raw preference entry for one gesture kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Action selector: "disabled", "2" (secondary button) or "3" (tertiary).
    pub action: String,
    /// Toggle mode: the button stays held until the gesture fires again.
    pub toggle: bool,
    /// Release the toggle automatically on the next tip lift.
    pub toggle_off_on_lift: bool,
    /// Hold duration for press mode, in milliseconds.
    pub duration_ms: String,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            action: "disabled".into(),
            toggle: false,
            toggle_off_on_lift: false,
            duration_ms: "150".into(),
        }
    }
}

/// Full pen preference snapshot, read wholesale on every reload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PenSettings {
    pub single_press: GestureSettings,
    pub double_press: GestureSettings,
    pub triple_press: GestureSettings,
    pub long_press: GestureSettings,
    pub long_press_and_click: GestureSettings,
    /// Show a notification for every detected gesture.
    pub show_detections: bool,
    /// Show toggle on/off notifications (debugging aid).
    pub show_toggle_debug: bool,
}

impl PenSettings {
    /// The preference entry for `kind`.
    pub fn gesture(&self, kind: GestureKind) -> &GestureSettings {
        match kind {
            GestureKind::SinglePress => &self.single_press,
            GestureKind::DoublePress => &self.double_press,
            GestureKind::TriplePress => &self.triple_press,
            GestureKind::LongPress => &self.long_press,
            GestureKind::LongPressAndClick => &self.long_press_and_click,
        }
    }

    /// Parse settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}
