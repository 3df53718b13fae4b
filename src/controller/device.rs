use crate::mapping::{CanonicalAction, CanonicalAxis, DeviceFamily};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::time::Instant;

/// One raw button as the host reports it
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawButton {
    pub pressed: bool,
    pub value: f32,
}

impl RawButton {
    pub fn pressed() -> Self {
        Self {
            pressed: true,
            value: 1.0,
        }
    }

    pub fn released() -> Self {
        Self::default()
    }
}

/// Everything the host knows about one device in one frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDeviceState {
    /// Logical slot, stable while the device stays connected
    pub index: usize,
    /// Free-text identifier used for classification and custom mappings
    pub id: String,
    pub name: String,
    pub buttons: Vec<RawButton>,
    /// Raw axis values in `-1.0..=1.0`, before deadzone
    pub axes: Vec<f32>,
}

impl RawDeviceState {
    /// Idle device with `buttons` released buttons and `axes` centered axes
    pub fn idle(index: usize, id: impl Into<String>, buttons: usize, axes: usize) -> Self {
        let id = id.into();
        Self {
            index,
            name: id.clone(),
            id,
            buttons: vec![RawButton::released(); buttons],
            axes: vec![0.0; axes],
        }
    }

    pub fn with_button(mut self, index: usize, pressed: bool) -> Self {
        if index >= self.buttons.len() {
            self.buttons.resize(index + 1, RawButton::released());
        }
        self.buttons[index] = if pressed {
            RawButton::pressed()
        } else {
            RawButton::released()
        };
        self
    }

    pub fn with_axis(mut self, index: usize, value: f32) -> Self {
        if index >= self.axes.len() {
            self.axes.resize(index + 1, 0.0);
        }
        self.axes[index] = value;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ButtonState {
    pub pressed: bool,
    /// True only on the tick where `pressed` went from false to true
    pub just_pressed: bool,
    pub value: f32,
}

/// Canonical per-tick view of a device
#[derive(Clone, Debug, PartialEq)]
pub struct Device {
    pub id: String,
    pub index: usize,
    pub name: String,
    pub family: DeviceFamily,
    pub connected: bool,
    pub buttons: Vec<ButtonState>,
    /// Post-deadzone values in raw order
    pub axes: Vec<f32>,
    pub actions: BTreeMap<CanonicalAction, ButtonState>,
    pub canonical_axes: BTreeMap<CanonicalAxis, f32>,
}

impl Device {
    /// State of a canonical action; unbound actions read as released
    pub fn action(&self, action: CanonicalAction) -> ButtonState {
        self.actions.get(&action).copied().unwrap_or_default()
    }

    pub fn just_pressed(&self, action: CanonicalAction) -> bool {
        self.action(action).just_pressed
    }

    pub fn is_pressed(&self, action: CanonicalAction) -> bool {
        self.action(action).pressed
    }

    /// Post-deadzone value of a canonical axis; unbound axes read as `0.0`
    pub fn axis(&self, axis: CanonicalAxis) -> f32 {
        self.canonical_axes.get(&axis).copied().unwrap_or(0.0)
    }
}

/// Everything published at the end of one tick
#[derive(Clone, Debug)]
pub struct TickSnapshot {
    pub tick: u64,
    pub now: Instant,
    pub captured_at: DateTime<Local>,
    /// Live devices plus, for one tick, devices that just disconnected
    pub devices: Vec<Device>,
}

impl TickSnapshot {
    pub fn device(&self, index: usize) -> Option<&Device> {
        self.devices.iter().find(|d| d.index == index)
    }

    pub fn connected(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.connected)
    }
}

/// Fired only on connect/disconnect transitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected {
        index: usize,
        id: String,
        family: DeviceFamily,
    },
    Disconnected {
        index: usize,
        id: String,
    },
}
