//! Raw keycode to gesture classification
//!
//! The pen reports one keycode per recognized gesture (600-604) as an
//! ordinary key down/up pair, with OS-level autorepeat mixed in and the
//! occasional duplicate delivery of the same up event. The classifier
//! pairs downs with ups and emits at most one gesture per physical press
//! cycle.

use penmap_core::{GestureKind, KeyAction, RawKeyEvent};
use tracing::trace;

/// Outcome of classifying one raw key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// Not a pen button keycode; the caller should handle the event normally.
    NotMine,
    /// Consumed without producing a gesture (down half, repeat, duplicate).
    Handled,
    /// Consumed and recognized as a gesture.
    Gesture(GestureKind),
}

impl Classified {
    /// Whether the event was consumed by the classifier.
    pub fn consumed(&self) -> bool {
        !matches!(self, Classified::NotMine)
    }
}

/// Pairs raw down/up key events into gesture emissions.
#[derive(Debug, Default)]
pub struct GestureClassifier {
    /// Keycode recorded on the last down half, awaiting its up.
    pending_code: Option<u16>,
    /// Timestamp of the last emitted gesture, for duplicate suppression.
    ///
    /// Exact-equality comparison: two genuinely distinct presses sharing a
    /// timestamp at the platform's clock resolution would suppress the
    /// second one. Accepted as-is; it has not been observed in practice.
    last_emitted_at: Option<u64>,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one raw key event.
    ///
    /// Guarantees at most one gesture emission per physical press/release
    /// cycle: autorepeat is consumed silently, a down alone never emits,
    /// and an up redelivered with the same timestamp is suppressed.
    pub fn classify(&mut self, event: &RawKeyEvent) -> Classified {
        if !GestureKind::is_pen_button(event.code) {
            return Classified::NotMine;
        }
        if event.repeat > 0 {
            return Classified::Handled;
        }
        match event.action {
            KeyAction::Down => {
                trace!(code = event.code, "pen button down");
                self.pending_code = Some(event.code);
                Classified::Handled
            }
            KeyAction::Up => {
                // Fall back to the up event's own code if no down was seen.
                let code = self.pending_code.take().unwrap_or(event.code);
                let Some(kind) = GestureKind::from_raw_code(code) else {
                    return Classified::Handled;
                };
                if self.last_emitted_at == Some(event.timestamp_ms) {
                    trace!(code, "duplicate up delivery suppressed");
                    return Classified::Handled;
                }
                self.last_emitted_at = Some(event.timestamp_ms);
                trace!(code, %kind, "pen button up");
                Classified::Gesture(kind)
            }
            KeyAction::Other => Classified::NotMine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(code: u16, action: KeyAction, repeat: u32, timestamp_ms: u64) -> RawKeyEvent {
        RawKeyEvent {
            code,
            action,
            repeat,
            timestamp_ms,
        }
    }

    #[test]
    fn test_down_up_emits_exactly_one_gesture() {
        let mut classifier = GestureClassifier::new();
        assert_eq!(
            classifier.classify(&event(600, KeyAction::Down, 0, 10)),
            Classified::Handled
        );
        assert_eq!(
            classifier.classify(&event(600, KeyAction::Up, 0, 20)),
            Classified::Gesture(GestureKind::SinglePress)
        );
    }

    #[test]
    fn test_repeats_are_consumed_without_gesture() {
        let mut classifier = GestureClassifier::new();
        for ts in 0..10 {
            let result = classifier.classify(&event(603, KeyAction::Down, 1, ts));
            assert_eq!(result, Classified::Handled);
        }
    }

    #[test]
    fn test_duplicate_up_timestamp_is_suppressed() {
        let mut classifier = GestureClassifier::new();
        classifier.classify(&event(601, KeyAction::Down, 0, 10));
        assert_eq!(
            classifier.classify(&event(601, KeyAction::Up, 0, 25)),
            Classified::Gesture(GestureKind::DoublePress)
        );
        // Same up event delivered again.
        assert_eq!(
            classifier.classify(&event(601, KeyAction::Up, 0, 25)),
            Classified::Handled
        );
        // A genuinely later press cycle emits again.
        classifier.classify(&event(601, KeyAction::Down, 0, 100));
        assert_eq!(
            classifier.classify(&event(601, KeyAction::Up, 0, 110)),
            Classified::Gesture(GestureKind::DoublePress)
        );
    }

    #[test]
    fn test_first_gesture_at_timestamp_zero_is_not_suppressed() {
        let mut classifier = GestureClassifier::new();
        classifier.classify(&event(600, KeyAction::Down, 0, 0));
        assert_eq!(
            classifier.classify(&event(600, KeyAction::Up, 0, 0)),
            Classified::Gesture(GestureKind::SinglePress)
        );
    }

    #[test]
    fn test_up_without_down_uses_its_own_code() {
        let mut classifier = GestureClassifier::new();
        assert_eq!(
            classifier.classify(&event(604, KeyAction::Up, 0, 5)),
            Classified::Gesture(GestureKind::LongPressAndClick)
        );
    }

    #[test]
    fn test_pending_down_code_wins_over_up_code() {
        let mut classifier = GestureClassifier::new();
        classifier.classify(&event(602, KeyAction::Down, 0, 1));
        assert_eq!(
            classifier.classify(&event(603, KeyAction::Up, 0, 2)),
            Classified::Gesture(GestureKind::TriplePress)
        );
    }

    #[test]
    fn test_foreign_keycodes_pass_through() {
        let mut classifier = GestureClassifier::new();
        let result = classifier.classify(&event(30, KeyAction::Down, 0, 1));
        assert_eq!(result, Classified::NotMine);
        assert!(!result.consumed());
        assert_eq!(
            classifier.classify(&event(599, KeyAction::Up, 0, 2)),
            Classified::NotMine
        );
        assert_eq!(
            classifier.classify(&event(605, KeyAction::Up, 0, 3)),
            Classified::NotMine
        );
    }

    #[test]
    fn test_other_actions_are_not_consumed() {
        let mut classifier = GestureClassifier::new();
        assert_eq!(
            classifier.classify(&event(600, KeyAction::Other, 0, 1)),
            Classified::NotMine
        );
    }
}
