//! Physical pen event device reader
//!
//! Streams events from the pen's evdev node and turns them into session
//! events: gesture keycodes become [`RawKeyEvent`]s immediately, while
//! pointer axes and contact keys accumulate into a [`PenState`] frame that
//! is delivered on each SYN_REPORT.

use evdev::{AbsoluteAxisCode, Device, EventType, KeyCode, SynchronizationCode};
use penmap_core::{ButtonMask, Error, GestureKind, KeyAction, PenState, RawKeyEvent, Result};
use penmap_gesture::SessionEvent;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{info, trace};

/// Pressure axis maximum assumed when the device does not report one.
const FALLBACK_PRESSURE_MAX: i32 = 4095;

/// Reads the physical pen device and feeds the session channel.
pub struct PenReader {
    device: Device,
    tx: mpsc::Sender<SessionEvent>,
    pressure_max: f64,
}

impl PenReader {
    /// Open the pen's event device node.
    pub fn open(path: &Path, tx: mpsc::Sender<SessionEvent>) -> Result<Self> {
        let device = Device::open(path).map_err(|e| Error::Device(e.to_string()))?;
        let pressure_max = device
            .get_absinfo()
            .ok()
            .and_then(|mut axes| axes.find(|(axis, _)| *axis == AbsoluteAxisCode::ABS_PRESSURE))
            .map(|(_, info)| info.maximum())
            .filter(|max| *max > 0)
            .unwrap_or(FALLBACK_PRESSURE_MAX);

        info!(
            "Opened pen device {} ({})",
            path.display(),
            device.name().unwrap_or("unnamed")
        );

        Ok(Self {
            device,
            tx,
            pressure_max: pressure_max as f64,
        })
    }

    /// Stream device events into the session channel until the device or
    /// the channel goes away.
    pub async fn run(self) -> Result<()> {
        let mut stream = self
            .device
            .into_event_stream()
            .map_err(|e| Error::Device(e.to_string()))?;
        let mut frame = PenFrame::new(self.pressure_max);

        loop {
            let event = stream
                .next_event()
                .await
                .map_err(|e| Error::Device(e.to_string()))?;

            let ty = event.event_type();
            if ty == EventType::KEY {
                let code = event.code();
                if GestureKind::is_pen_button(code) {
                    let (action, repeat) = key_action(event.value());
                    let raw = RawKeyEvent {
                        code,
                        action,
                        repeat,
                        timestamp_ms: timestamp_ms(event.timestamp()),
                    };
                    trace!(?raw, "pen button event");
                    self.tx
                        .send(SessionEvent::Key(raw))
                        .await
                        .map_err(|_| Error::ChannelClosed)?;
                } else {
                    frame.key(code, event.value());
                }
            } else if ty == EventType::ABSOLUTE {
                frame.abs(event.code(), event.value());
            } else if ty == EventType::SYNCHRONIZATION
                && event.code() == SynchronizationCode::SYN_REPORT.0
            {
                self.tx
                    .send(SessionEvent::Pen(frame.snapshot()))
                    .await
                    .map_err(|_| Error::ChannelClosed)?;
            }
        }
    }
}

/// Map an EV_KEY value to an action and repeat count. The kernel reports
/// 0 for release, 1 for press and 2 for autorepeat.
fn key_action(value: i32) -> (KeyAction, u32) {
    match value {
        0 => (KeyAction::Up, 0),
        1 => (KeyAction::Down, 0),
        2 => (KeyAction::Down, 1),
        _ => (KeyAction::Other, 0),
    }
}

fn timestamp_ms(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Accumulates axis and key events into a pen state snapshot.
///
/// Devices only report axes that changed, so the state persists across
/// frames and each SYN_REPORT snapshots whatever is current.
struct PenFrame {
    state: PenState,
    pressure_max: f64,
}

impl PenFrame {
    fn new(pressure_max: f64) -> Self {
        Self {
            state: PenState::default(),
            pressure_max,
        }
    }

    fn abs(&mut self, code: u16, value: i32) {
        if code == AbsoluteAxisCode::ABS_X.0 {
            self.state.x = value as f64;
        } else if code == AbsoluteAxisCode::ABS_Y.0 {
            self.state.y = value as f64;
        } else if code == AbsoluteAxisCode::ABS_PRESSURE.0 {
            self.state.pressure = (value as f64 / self.pressure_max).clamp(0.0, 1.0);
        } else if code == AbsoluteAxisCode::ABS_TILT_X.0 {
            self.state.tilt_x = value as f64;
        } else if code == AbsoluteAxisCode::ABS_TILT_Y.0 {
            self.state.tilt_y = value as f64;
        }
    }

    fn key(&mut self, code: u16, value: i32) {
        let pressed = value != 0;
        if code == KeyCode::BTN_TOUCH.0 {
            self.state.buttons.set(ButtonMask::PRIMARY, pressed);
        } else if code == KeyCode::BTN_STYLUS.0 {
            self.state.buttons.set(ButtonMask::SECONDARY, pressed);
        } else if code == KeyCode::BTN_STYLUS2.0 {
            self.state.buttons.set(ButtonMask::TERTIARY, pressed);
        } else if code == KeyCode::BTN_TOOL_RUBBER.0 {
            self.state.eraser = pressed;
        }
    }

    fn snapshot(&self) -> PenState {
        self.state
    }
}
