use super::device::{RawButton, RawDeviceState};
use super::poller::PollerError;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Host capability that reports every present device once per frame.
///
/// Implementations only read; edge detection, classification and mapping all
/// happen downstream in the tracker.
pub trait InputSource: Send + fmt::Debug {
    fn snapshot(&mut self) -> Vec<RawDeviceState>;
}

// Standard gamepad order; the default family tables index into this.
pub const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

// gilrs reports Y up as positive; downstream expects down as positive.
pub const STANDARD_AXES: [(Axis, f32); 6] = [
    (Axis::LeftStickX, 1.0),
    (Axis::LeftStickY, -1.0),
    (Axis::RightStickX, 1.0),
    (Axis::RightStickY, -1.0),
    (Axis::DPadX, 1.0),
    (Axis::DPadY, -1.0),
];

/// gilrs-backed source for real hardware
pub struct GilrsSource {
    gilrs: Gilrs,
}

impl fmt::Debug for GilrsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GilrsSource")
            .field("gamepads", &self.gilrs.gamepads().count())
            .finish()
    }
}

impl GilrsSource {
    pub fn new() -> Result<Self, PollerError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(PollerError::InitializationError(e.to_string()));
            }
        };

        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = gilrs.gamepads().collect();
        if gamepads.is_empty() {
            warn!("No gamepad connected, continuing in idle mode");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!(
                    "  [{}] ID: {}, Name: {}, UUID: {:?}",
                    idx,
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
            }
        }

        Ok(Self { gilrs })
    }

    // Drain pending events so gilrs' cached gamepad state is current
    fn pump_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Controller {} connected", id),
                EventType::Disconnected => warn!("Controller {} disconnected", id),
                _ => {}
            }
        }
        self.gilrs.inc();
    }
}

impl InputSource for GilrsSource {
    fn snapshot(&mut self) -> Vec<RawDeviceState> {
        self.pump_events();
        self.gilrs
            .gamepads()
            .map(|(id, gamepad)| raw_state(id, &gamepad))
            .collect()
    }
}

fn raw_state(id: GamepadId, gamepad: &Gamepad<'_>) -> RawDeviceState {
    let buttons = STANDARD_BUTTONS
        .iter()
        .map(|&button| {
            let pressed = gamepad.is_pressed(button);
            let value = gamepad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or(if pressed { 1.0 } else { 0.0 });
            RawButton { pressed, value }
        })
        .collect();

    let axes = STANDARD_AXES
        .iter()
        .map(|&(axis, sign)| {
            let value = gamepad.value(axis) * sign;
            match axis {
                Axis::DPadX => dpad_axis_value(
                    value,
                    gamepad.is_pressed(Button::DPadLeft),
                    gamepad.is_pressed(Button::DPadRight),
                ),
                Axis::DPadY => dpad_axis_value(
                    value,
                    gamepad.is_pressed(Button::DPadUp),
                    gamepad.is_pressed(Button::DPadDown),
                ),
                _ => value,
            }
        })
        .collect();

    // Vendor/product ids help classification when the name is generic
    let device_id = match (gamepad.vendor_id(), gamepad.product_id()) {
        (Some(vendor), Some(product)) => {
            format!("{} ({:04x}:{:04x})", gamepad.name(), vendor, product)
        }
        _ => gamepad.name().to_string(),
    };

    RawDeviceState {
        index: usize::from(id),
        id: device_id,
        name: gamepad.name().to_string(),
        buttons,
        axes,
    }
}

/// D-pad axis as reported, or derived from the d-pad buttons when the
/// backend only exposes them as buttons. Negative is left/up.
fn dpad_axis_value(reported: f32, negative: bool, positive: bool) -> f32 {
    if reported != 0.0 {
        return reported;
    }
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// Replays prepared frames; the last frame repeats once the script runs out.
///
/// Used by tests and by hosts that feed input from elsewhere.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Vec<RawDeviceState>>,
    last: Vec<RawDeviceState>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Vec<RawDeviceState>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            last: Vec::new(),
        }
    }

    pub fn push(&mut self, frame: Vec<RawDeviceState>) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedSource {
    fn snapshot(&mut self) -> Vec<RawDeviceState> {
        if let Some(frame) = self.frames.pop_front() {
            debug!("Scripted frame with {} devices", frame.len());
            self.last = frame;
        }
        self.last.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_only_dpad_fills_its_axis() {
        assert_eq!(dpad_axis_value(0.0, false, true), 1.0);
        assert_eq!(dpad_axis_value(0.0, true, false), -1.0);
        assert_eq!(dpad_axis_value(0.0, true, true), 0.0);
        assert_eq!(dpad_axis_value(-1.0, false, true), -1.0);
    }

    #[test]
    fn scripted_source_repeats_last_frame() {
        let pad = RawDeviceState::idle(0, "pad", 17, 6);
        let mut source = ScriptedSource::new(vec![vec![pad.clone()], vec![]]);

        assert_eq!(source.snapshot(), vec![pad]);
        assert!(source.snapshot().is_empty());
        assert!(source.snapshot().is_empty());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn standard_layout_matches_default_tables() {
        use crate::mapping::action::XBOX_LAYOUT;
        use crate::mapping::CanonicalAction;

        assert_eq!(STANDARD_BUTTONS.len(), crate::mapping::CanonicalAction::COUNT);
        let confirm = XBOX_LAYOUT.button_index(CanonicalAction::Confirm).unwrap();
        assert_eq!(STANDARD_BUTTONS[confirm], Button::South);
        let up = XBOX_LAYOUT.button_index(CanonicalAction::DpadUp).unwrap();
        assert_eq!(STANDARD_BUTTONS[up], Button::DPadUp);
    }
}
