//! Raw pen button protocol and pointer state types

use bitflags::bitflags;

/// Semantic pen button gestures reported by the pen firmware.
///
/// The pen classifies barrel-button presses itself and reports one keycode
/// per recognized gesture, 600-604 in the order listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    SinglePress,
    DoublePress,
    TriplePress,
    LongPress,
    LongPressAndClick,
}

impl GestureKind {
    /// Number of gesture kinds.
    pub const COUNT: usize = 5;

    /// All kinds, in raw keycode order.
    pub const ALL: [GestureKind; Self::COUNT] = [
        GestureKind::SinglePress,
        GestureKind::DoublePress,
        GestureKind::TriplePress,
        GestureKind::LongPress,
        GestureKind::LongPressAndClick,
    ];

    /// Map a raw keycode to a gesture kind, if it is one of ours.
    pub fn from_raw_code(code: u16) -> Option<Self> {
        match code {
            600 => Some(GestureKind::SinglePress),
            601 => Some(GestureKind::DoublePress),
            602 => Some(GestureKind::TriplePress),
            603 => Some(GestureKind::LongPress),
            604 => Some(GestureKind::LongPressAndClick),
            _ => None,
        }
    }

    /// Whether `code` falls in the pen button keycode range.
    pub fn is_pen_button(code: u16) -> bool {
        Self::from_raw_code(code).is_some()
    }

    /// The raw keycode this kind is reported as.
    pub fn raw_code(self) -> u16 {
        600 + self.index() as u16
    }

    /// Stable index for fixed-size per-kind tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            GestureKind::SinglePress => "single press",
            GestureKind::DoublePress => "double press",
            GestureKind::TriplePress => "triple press",
            GestureKind::LongPress => "long press",
            GestureKind::LongPressAndClick => "long press + click",
        })
    }
}

/// Key event action, as delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
    /// Anything that is neither a press nor a release.
    Other,
}

/// One raw key event from the pen's input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub code: u16,
    pub action: KeyAction,
    /// Autorepeat count; nonzero events are repeat noise.
    pub repeat: u32,
    pub timestamp_ms: u64,
}

bitflags! {
    /// Stylus button bits, matching the raw protocol's button constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonMask: u32 {
        /// Tip contact.
        const PRIMARY = 0x1;
        /// First barrel button (right-click equivalent).
        const SECONDARY = 0x2;
        /// Second barrel button (middle-click equivalent).
        const TERTIARY = 0x4;
    }
}

/// Snapshot of the pen pointer state as last reported by the device.
///
/// The mapper only ever inspects `buttons` and `pressure`; the remaining
/// axes pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PenState {
    pub x: f64,
    pub y: f64,
    /// Normalized pressure, 0.0-1.0.
    pub pressure: f64,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub buttons: ButtonMask,
    pub eraser: bool,
}

impl PenState {
    /// Whether the tip is in contact with the surface.
    pub fn tip_in_contact(&self) -> bool {
        self.buttons.contains(ButtonMask::PRIMARY) || self.pressure > 0.0
    }
}
