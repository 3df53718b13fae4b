use crate::controller::device::Device;
use crate::mapping::{CanonicalAction, CanonicalAxis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magnitude a d-pad axis must exceed to count as pressed
pub const DPAD_AXIS_THRESHOLD: f32 = 0.5;

/// Magnitude the dominant left-stick axis must exceed
pub const STICK_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{}", name)
    }
}

const DPAD_BUTTONS: [(CanonicalAction, Direction); 4] = [
    (CanonicalAction::DpadUp, Direction::Up),
    (CanonicalAction::DpadDown, Direction::Down),
    (CanonicalAction::DpadLeft, Direction::Left),
    (CanonicalAction::DpadRight, Direction::Right),
];

/// Picks the direction of a 2D value, or none when the dominant axis does
/// not strictly exceed `threshold`. Ties go to the vertical axis.
fn axis_direction(x: f32, y: f32, threshold: f32) -> Option<Direction> {
    if y.abs() >= x.abs() {
        if y.abs() > threshold {
            return Some(if y < 0.0 { Direction::Up } else { Direction::Down });
        }
    } else if x.abs() > threshold {
        return Some(if x < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        });
    }
    None
}

/// At most one direction for this device on this tick.
///
/// Checked in order, first match wins:
/// 1. d-pad button presses (edges only)
/// 2. d-pad axes
/// 3. left stick
pub fn resolve_direction(device: &Device) -> Option<Direction> {
    if let Some((_, dir)) = DPAD_BUTTONS
        .iter()
        .find(|(action, _)| device.just_pressed(*action))
    {
        return Some(*dir);
    }

    axis_direction(
        device.axis(CanonicalAxis::DpadX),
        device.axis(CanonicalAxis::DpadY),
        DPAD_AXIS_THRESHOLD,
    )
    .or_else(|| {
        axis_direction(
            device.axis(CanonicalAxis::LeftStickX),
            device.axis(CanonicalAxis::LeftStickY),
            STICK_THRESHOLD,
        )
    })
}
