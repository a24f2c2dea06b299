//! Gesture to button-state mapping state machine
//!
//! Pure transition core: every entry point takes whatever it needs of the
//! collaborator's current state as a parameter and returns the commands to
//! execute, in order. The surrounding session performs the actual I/O,
//! which keeps the machine testable without a device or a scheduler.

use crate::table::{GestureMode, GestureTable};
use penmap_core::{ButtonMask, GestureKind, PenState};
use std::time::Duration;
use tracing::debug;

/// Read-modify-write update of the output button mask.
///
/// The shell applies the patch against the mask it reads at execution
/// time; the machine never bakes a stale snapshot into a command. Other
/// input paths may touch the output mask between an event and a scheduled
/// release, so this is load-bearing, not a convenience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonPatch {
    pub set: ButtonMask,
    pub clear: ButtonMask,
}

impl ButtonPatch {
    /// Patch that turns `mask` bits on.
    pub fn set_bits(mask: ButtonMask) -> Self {
        Self {
            set: mask,
            clear: ButtonMask::empty(),
        }
    }

    /// Patch that turns `mask` bits off.
    pub fn clear_bits(mask: ButtonMask) -> Self {
        Self {
            set: ButtonMask::empty(),
            clear: mask,
        }
    }

    /// Patch that forces `mask` bits to `on`.
    pub fn assign(mask: ButtonMask, on: bool) -> Self {
        if on {
            Self::set_bits(mask)
        } else {
            Self::clear_bits(mask)
        }
    }

    /// Apply against a current mask.
    pub fn apply(&self, current: ButtonMask) -> ButtonMask {
        (current - self.clear) | self.set
    }
}

/// Commands the state machine asks the shell to execute, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Update the output button mask read-modify-write.
    Buttons(ButtonPatch),
    /// Inform the device layer which bits are toggle-held.
    ToggleIndicator(ButtonMask),
    /// Show a user-facing notification. Fire-and-forget.
    Notify(String),
    /// Schedule a release callback for `kind` after `delay`, replacing any
    /// earlier one for the same kind.
    Schedule { kind: GestureKind, delay: Duration },
    /// Cancel the scheduled release for `kind`. No-op if already fired.
    CancelRelease(GestureKind),
}

/// Timed release recorded when a press-mode gesture fires.
///
/// Stored as a value rather than a live callback so cancellation and
/// supersession stay explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRelease {
    mask: ButtonMask,
    /// Whether the bits were already set when the press fired. The release
    /// restores them to that state instead of clearing unconditionally, so
    /// a button held by another mechanism is not yanked away.
    was_set: bool,
}

/// Maps classified pen gestures onto the virtual stylus button state.
///
/// Owns the toggle mask, the off-on-lift subset, the pending releases and
/// the tip contact state. All transitions are synchronous and bounded by
/// the number of gesture kinds.
#[derive(Debug, Default)]
pub struct GestureMapper {
    table: GestureTable,
    /// Bits currently held on by toggle gestures.
    toggled: ButtonMask,
    /// Subset of `toggled` that clears on the next tip lift.
    off_on_lift: ButtonMask,
    pending: [Option<PendingRelease>; GestureKind::COUNT],
    tip_down: bool,
}

impl GestureMapper {
    pub fn new(table: GestureTable) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    /// The table currently in effect.
    pub fn table(&self) -> &GestureTable {
        &self.table
    }

    /// Bits currently toggle-held.
    pub fn toggled(&self) -> ButtonMask {
        self.toggled
    }

    /// Handle a classified gesture. `current` is the collaborator's output
    /// button mask at this instant; press mode needs it to remember the
    /// pre-press bit state.
    pub fn on_gesture(&mut self, kind: GestureKind, current: ButtonMask) -> Vec<Command> {
        let cfg = *self.table.get(kind);
        let mut cmds = Vec::new();

        // Detection and toggle-debug notifications are independent
        // policies; a toggle gesture fires at most the toggle-specific one.
        let is_toggle = cfg.mode == GestureMode::Toggle;
        if self.table.show_detections() && !(is_toggle && self.table.show_toggle_debug()) {
            cmds.push(Command::Notify(kind.to_string()));
        }

        if cfg.buttons.is_empty() {
            return cmds;
        }

        if self.pending[kind.index()].take().is_some() {
            cmds.push(Command::CancelRelease(kind));
        }
        // Latest gesture wins: pending releases on overlapping buttons are
        // superseded, whichever gesture scheduled them.
        for other in GestureKind::ALL {
            if other != kind
                && self.pending[other.index()].is_some()
                && self.table.get(other).buttons.intersects(cfg.buttons)
            {
                self.pending[other.index()] = None;
                cmds.push(Command::CancelRelease(other));
            }
        }

        match cfg.mode {
            GestureMode::Toggle => {
                self.apply_toggle(kind, cfg.buttons, cfg.off_on_lift, &mut cmds)
            }
            GestureMode::Press => self.apply_press(kind, cfg.buttons, cfg.hold, current, &mut cmds),
        }
        cmds
    }

    fn apply_toggle(
        &mut self,
        kind: GestureKind,
        mask: ButtonMask,
        off_on_lift: bool,
        cmds: &mut Vec<Command>,
    ) {
        // Normalize-then-flip: clearing first makes a stale partial overlap
        // resolve to a clean all-on or all-off state.
        let was_on = self.toggled.intersects(mask);
        self.toggled.remove(mask);
        if !was_on {
            self.toggled.insert(mask);
        }
        let on = !was_on;

        cmds.push(Command::Buttons(ButtonPatch::assign(mask, on)));
        cmds.push(Command::ToggleIndicator(self.toggled));

        if off_on_lift {
            if on {
                self.off_on_lift.insert(mask);
            } else {
                // Toggling off manually also cancels the pending auto-off.
                self.off_on_lift.remove(mask);
            }
        }

        if self.table.show_toggle_debug() {
            let state = if on { "ON" } else { "OFF" };
            cmds.push(Command::Notify(format!("{kind} toggle {state}")));
        }
        debug!(%kind, ?mask, on, "toggle applied");
    }

    fn apply_press(
        &mut self,
        kind: GestureKind,
        mask: ButtonMask,
        hold: Duration,
        current: ButtonMask,
        cmds: &mut Vec<Command>,
    ) {
        // Press mode overrides an active toggle on the same bits.
        if self.toggled.intersects(mask) {
            self.toggled.remove(mask);
            cmds.push(Command::ToggleIndicator(self.toggled));
        }
        // A transient press must not be auto-released by a tip lift.
        self.off_on_lift.remove(mask);

        let was_set = current.intersects(mask);
        cmds.push(Command::Buttons(ButtonPatch::set_bits(mask)));
        self.pending[kind.index()] = Some(PendingRelease { mask, was_set });
        cmds.push(Command::Schedule { kind, delay: hold });
        debug!(%kind, ?mask, was_set, hold_ms = hold.as_millis() as u64, "press applied");
    }

    /// Handle a scheduled release coming due. Stale callbacks (canceled or
    /// superseded since they were scheduled) are ignored.
    pub fn on_release_due(&mut self, kind: GestureKind) -> Vec<Command> {
        let Some(release) = self.pending[kind.index()].take() else {
            return Vec::new();
        };
        debug!(%kind, ?release.mask, release.was_set, "press release due");
        vec![Command::Buttons(ButtonPatch::assign(
            release.mask,
            release.was_set,
        ))]
    }

    /// Feed a pen pointer state update; only tip contact transitions have
    /// any effect.
    pub fn on_pen_state(&mut self, state: &PenState) -> Vec<Command> {
        self.on_tip_contact(state.tip_in_contact())
    }

    /// Handle a tip contact change derived from the pointer stream.
    pub fn on_tip_contact(&mut self, now_down: bool) -> Vec<Command> {
        let was_down = self.tip_down;
        self.tip_down = now_down;
        if now_down == was_down || now_down {
            // Repeated state, or newly touching: nothing to do on contact.
            return Vec::new();
        }
        let bits = self.off_on_lift;
        if bits.is_empty() {
            return Vec::new();
        }
        self.toggled.remove(bits);
        self.off_on_lift = ButtonMask::empty();
        debug!(?bits, "tip lift cleared toggles");
        vec![
            Command::ToggleIndicator(self.toggled),
            Command::Buttons(ButtonPatch::clear_bits(bits)),
        ]
    }

    /// Swap in a freshly rebuilt table and drop all accumulated state.
    /// Nothing survives a reload: toggles, auto-off bits and scheduled
    /// releases are all discarded.
    pub fn reload(&mut self, table: GestureTable) -> Vec<Command> {
        self.table = table;
        self.toggled = ButtonMask::empty();
        self.off_on_lift = ButtonMask::empty();
        let mut cmds = Vec::new();
        for kind in GestureKind::ALL {
            if self.pending[kind.index()].take().is_some() {
                cmds.push(Command::CancelRelease(kind));
            }
        }
        cmds.push(Command::ToggleIndicator(ButtonMask::empty()));
        cmds
    }
}
