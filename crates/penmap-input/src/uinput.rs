//! Virtual uinput device exposing the mapped stylus buttons

use evdev::{
    uinput::VirtualDevice as EvdevVirtualDevice, AttributeSet, EventType, InputEvent, KeyCode,
};
use penmap_core::{ButtonMask, Error, Result};
use penmap_gesture::ButtonSink;
use tracing::{debug, info};

/// Virtual stylus-button device.
///
/// Exposes the three mappable button bits as evdev keys: tip contact as
/// BTN_TOUCH, the secondary button as BTN_STYLUS and the tertiary one as
/// BTN_STYLUS2. Tracks the mask it last emitted so updates only send the
/// bits that actually changed.
pub struct VirtualPenButtons {
    device: EvdevVirtualDevice,
    name: String,
    buttons: ButtonMask,
    toggle_indicator: ButtonMask,
}

impl VirtualPenButtons {
    /// Create the uinput device.
    pub fn new(name: &str) -> Result<Self> {
        let mut keys = AttributeSet::<KeyCode>::new();
        keys.insert(KeyCode::BTN_TOUCH);
        keys.insert(KeyCode::BTN_TOOL_PEN);
        keys.insert(KeyCode::BTN_STYLUS);
        keys.insert(KeyCode::BTN_STYLUS2);

        let device = EvdevVirtualDevice::builder()
            .map_err(|e| Error::UinputCreation(e.to_string()))?
            .name(name)
            .with_keys(&keys)
            .map_err(|e| Error::UinputCreation(e.to_string()))?
            .build()
            .map_err(|e| Error::UinputCreation(e.to_string()))?;

        info!("Created virtual pen button device: {}", name);

        Ok(Self {
            device,
            name: name.to_string(),
            buttons: ButtonMask::empty(),
            toggle_indicator: ButtonMask::empty(),
        })
    }

    /// Get the device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bits currently published as toggle-held.
    pub fn toggle_indicator(&self) -> ButtonMask {
        self.toggle_indicator
    }

    fn key_for(bit: ButtonMask) -> KeyCode {
        if bit == ButtonMask::PRIMARY {
            KeyCode::BTN_TOUCH
        } else if bit == ButtonMask::SECONDARY {
            KeyCode::BTN_STYLUS
        } else {
            KeyCode::BTN_STYLUS2
        }
    }
}

impl ButtonSink for VirtualPenButtons {
    fn current_buttons(&self) -> ButtonMask {
        self.buttons
    }

    fn send_buttons(&mut self, next: ButtonMask) -> Result<()> {
        let changed = self.buttons ^ next;
        if changed.is_empty() {
            return Ok(());
        }

        let mut events = Vec::new();
        for bit in [ButtonMask::PRIMARY, ButtonMask::SECONDARY, ButtonMask::TERTIARY] {
            if changed.contains(bit) {
                events.push(InputEvent::new(
                    EventType::KEY.0,
                    Self::key_for(bit).0,
                    i32::from(next.contains(bit)),
                ));
            }
        }
        events.push(InputEvent::new(EventType::SYNCHRONIZATION.0, 0, 0));

        debug!(?next, "virtual button state updated");
        self.buttons = next;
        self.device
            .emit(&events)
            .map_err(|e| Error::Input(e.to_string()))
    }

    fn set_toggle_indicator(&mut self, mask: ButtonMask) {
        if mask != self.toggle_indicator {
            debug!(?mask, "toggle indicator updated");
        }
        self.toggle_indicator = mask;
    }
}
