//! Resolved per-gesture configuration table
//!
//! Rebuilt wholesale from the raw preference snapshot on every reload; the
//! old table is discarded so no stale mapping bits carry over.

use penmap_core::{ButtonMask, GestureKind, GestureSettings, PenSettings};
use std::time::Duration;
use tracing::warn;

/// Hold duration substituted when the preference value fails to parse.
const DEFAULT_HOLD_MS: u64 = 150;
/// Hold duration bounds, in milliseconds.
const MIN_HOLD_MS: u64 = 10;
const MAX_HOLD_MS: u64 = 8192;

/// How a gesture drives its target buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    /// Hold the buttons for a fixed duration, then restore them.
    Press,
    /// Flip a persistent button state that survives until toggled off.
    Toggle,
}

/// Resolved configuration for one gesture kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureConfig {
    /// Target buttons; empty means the gesture is disabled.
    pub buttons: ButtonMask,
    pub mode: GestureMode,
    /// Toggle mode only: clear the toggle on the next tip lift.
    pub off_on_lift: bool,
    /// Press mode only: how long to hold before the scheduled release.
    pub hold: Duration,
}

impl GestureConfig {
    pub fn is_disabled(&self) -> bool {
        self.buttons.is_empty()
    }
}

/// Validated gesture configuration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureTable {
    configs: [GestureConfig; GestureKind::COUNT],
    show_detections: bool,
    show_toggle_debug: bool,
}

impl Default for GestureTable {
    fn default() -> Self {
        Self::rebuild(&PenSettings::default())
    }
}

impl GestureTable {
    /// Resolve the raw preference snapshot into a validated table.
    pub fn rebuild(settings: &PenSettings) -> Self {
        let mut configs = GestureKind::ALL.map(|kind| resolve(settings.gesture(kind)));
        resolve_conflicts(&mut configs);
        Self {
            configs,
            show_detections: settings.show_detections,
            show_toggle_debug: settings.show_toggle_debug,
        }
    }

    pub fn get(&self, kind: GestureKind) -> &GestureConfig {
        &self.configs[kind.index()]
    }

    /// Whether to notify on every detected gesture.
    pub fn show_detections(&self) -> bool {
        self.show_detections
    }

    /// Whether to notify on toggle state changes.
    pub fn show_toggle_debug(&self) -> bool {
        self.show_toggle_debug
    }
}

fn resolve(raw: &GestureSettings) -> GestureConfig {
    // Unrecognized selectors degrade to disabled, never an error.
    let buttons = match raw.action.as_str() {
        "2" => ButtonMask::SECONDARY,
        "3" => ButtonMask::TERTIARY,
        _ => ButtonMask::empty(),
    };
    let hold_ms = raw
        .duration_ms
        .trim()
        .parse::<u64>()
        .unwrap_or(DEFAULT_HOLD_MS)
        .clamp(MIN_HOLD_MS, MAX_HOLD_MS);
    GestureConfig {
        buttons,
        mode: if raw.toggle {
            GestureMode::Toggle
        } else {
            GestureMode::Press
        },
        off_on_lift: raw.toggle && raw.toggle_off_on_lift,
        hold: Duration::from_millis(hold_ms),
    }
}

/// Disable the higher-index gesture of any pair mapped to the same nonzero
/// buttons with the same mode. Enum order is the tie-break, so the outcome
/// is deterministic on every rebuild.
fn resolve_conflicts(configs: &mut [GestureConfig; GestureKind::COUNT]) {
    for i in 0..configs.len() {
        if configs[i].buttons.is_empty() {
            continue;
        }
        for j in (i + 1)..configs.len() {
            if configs[j].buttons == configs[i].buttons && configs[j].mode == configs[i].mode {
                warn!(
                    kept = %GestureKind::ALL[i],
                    disabled = %GestureKind::ALL[j],
                    buttons = ?configs[i].buttons,
                    "conflicting gesture mappings, disabling the later gesture"
                );
                configs[j].buttons = ButtonMask::empty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PenSettings {
        PenSettings::default()
    }

    #[test]
    fn test_action_selector_mapping() {
        let mut s = settings();
        s.single_press.action = "2".into();
        s.double_press.action = "3".into();
        s.triple_press.action = "disabled".into();
        s.long_press.action = "banana".into();
        let table = GestureTable::rebuild(&s);
        assert_eq!(table.get(GestureKind::SinglePress).buttons, ButtonMask::SECONDARY);
        assert_eq!(table.get(GestureKind::DoublePress).buttons, ButtonMask::TERTIARY);
        assert!(table.get(GestureKind::TriplePress).is_disabled());
        assert!(table.get(GestureKind::LongPress).is_disabled());
    }

    #[test]
    fn test_unparseable_duration_uses_default() {
        let mut s = settings();
        s.single_press.action = "2".into();
        s.single_press.duration_ms = "soon".into();
        let table = GestureTable::rebuild(&s);
        assert_eq!(table.get(GestureKind::SinglePress).hold, Duration::from_millis(150));
    }

    #[test]
    fn test_duration_is_clamped() {
        let mut s = settings();
        s.single_press.action = "2".into();
        s.single_press.duration_ms = "3".into();
        s.double_press.action = "3".into();
        s.double_press.duration_ms = "100000".into();
        let table = GestureTable::rebuild(&s);
        assert_eq!(table.get(GestureKind::SinglePress).hold, Duration::from_millis(10));
        assert_eq!(table.get(GestureKind::DoublePress).hold, Duration::from_millis(8192));
    }

    #[test]
    fn test_conflict_disables_higher_index_kind() {
        let mut s = settings();
        s.double_press.action = "2".into();
        s.long_press.action = "2".into();
        let table = GestureTable::rebuild(&s);
        assert_eq!(table.get(GestureKind::DoublePress).buttons, ButtonMask::SECONDARY);
        assert!(table.get(GestureKind::LongPress).is_disabled());
    }

    #[test]
    fn test_same_buttons_different_mode_is_not_a_conflict() {
        let mut s = settings();
        s.single_press.action = "2".into();
        s.double_press.action = "2".into();
        s.double_press.toggle = true;
        let table = GestureTable::rebuild(&s);
        assert_eq!(table.get(GestureKind::SinglePress).buttons, ButtonMask::SECONDARY);
        assert_eq!(table.get(GestureKind::DoublePress).buttons, ButtonMask::SECONDARY);
    }

    #[test]
    fn test_conflict_resolution_is_deterministic() {
        let mut s = settings();
        s.single_press.action = "3".into();
        s.triple_press.action = "3".into();
        s.long_press_and_click.action = "3".into();
        let first = GestureTable::rebuild(&s);
        let second = GestureTable::rebuild(&s);
        assert_eq!(first, second);
        assert_eq!(first.get(GestureKind::SinglePress).buttons, ButtonMask::TERTIARY);
        assert!(first.get(GestureKind::TriplePress).is_disabled());
        assert!(first.get(GestureKind::LongPressAndClick).is_disabled());
    }

    #[test]
    fn test_off_on_lift_requires_toggle_mode() {
        let mut s = settings();
        s.single_press.action = "2".into();
        s.single_press.toggle_off_on_lift = true;
        s.double_press.action = "3".into();
        s.double_press.toggle = true;
        s.double_press.toggle_off_on_lift = true;
        let table = GestureTable::rebuild(&s);
        assert!(!table.get(GestureKind::SinglePress).off_on_lift);
        assert!(table.get(GestureKind::DoublePress).off_on_lift);
    }
}
