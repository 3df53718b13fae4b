//! Canonical actions, canonical axes and the per-family default tables.
//!
//! Raw indices follow the standard gamepad layout that the gilrs source emits:
//!
//! ```text
//! 0 South   1 East    2 West    3 North
//! 4 LB      5 RB      6 LT      7 RT
//! 8 Select  9 Start  10 LS     11 RS
//! 12 Up    13 Down   14 Left   15 Right   16 Home
//!
//! axes: 0 LX  1 LY  2 RX  3 RY  4 DPadX  5 DPadY   (Y grows downwards)
//! ```

use super::family::DeviceFamily;
use serde::{Deserialize, Serialize};

/// Family-independent button names UI code binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalAction {
    Confirm,
    Back,
    OptionPrimary,
    OptionSecondary,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    LeftStickClick,
    RightStickClick,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Home,
}

impl CanonicalAction {
    pub const COUNT: usize = 17;

    pub const ALL: [CanonicalAction; Self::COUNT] = [
        CanonicalAction::Confirm,
        CanonicalAction::Back,
        CanonicalAction::OptionPrimary,
        CanonicalAction::OptionSecondary,
        CanonicalAction::LeftBumper,
        CanonicalAction::RightBumper,
        CanonicalAction::LeftTrigger,
        CanonicalAction::RightTrigger,
        CanonicalAction::Select,
        CanonicalAction::Start,
        CanonicalAction::LeftStickClick,
        CanonicalAction::RightStickClick,
        CanonicalAction::DpadUp,
        CanonicalAction::DpadDown,
        CanonicalAction::DpadLeft,
        CanonicalAction::DpadRight,
        CanonicalAction::Home,
    ];

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// Family-independent analog axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalAxis {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    DpadX,
    DpadY,
}

impl CanonicalAxis {
    pub const COUNT: usize = 6;

    pub const ALL: [CanonicalAxis; Self::COUNT] = [
        CanonicalAxis::LeftStickX,
        CanonicalAxis::LeftStickY,
        CanonicalAxis::RightStickX,
        CanonicalAxis::RightStickY,
        CanonicalAxis::DpadX,
        CanonicalAxis::DpadY,
    ];

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSign {
    #[default]
    Positive,
    Negative,
}

/// Where a canonical axis is read from on the raw device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisBinding {
    pub index: usize,
    pub sign: AxisSign,
}

impl AxisBinding {
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            sign: AxisSign::Positive,
        }
    }

    pub const fn inverted(index: usize) -> Self {
        Self {
            index,
            sign: AxisSign::Negative,
        }
    }

    /// Applies the binding's sign to a raw value
    pub fn apply(&self, value: f32) -> f32 {
        match self.sign {
            AxisSign::Positive => value,
            AxisSign::Negative => -value,
        }
    }
}

/// Default table for one family
#[derive(Debug, Clone, Copy)]
pub struct FamilyLayout {
    pub family: DeviceFamily,
    pub buttons: &'static [(CanonicalAction, usize)],
    pub axes: &'static [(CanonicalAxis, AxisBinding)],
}

impl FamilyLayout {
    pub fn button_index(&self, action: CanonicalAction) -> Option<usize> {
        self.buttons
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, index)| *index)
    }

    pub fn axis_binding(&self, axis: CanonicalAxis) -> Option<AxisBinding> {
        self.axes
            .iter()
            .find(|(a, _)| *a == axis)
            .map(|(_, binding)| *binding)
    }
}

const STANDARD_AXES: &[(CanonicalAxis, AxisBinding)] = &[
    (CanonicalAxis::LeftStickX, AxisBinding::new(0)),
    (CanonicalAxis::LeftStickY, AxisBinding::new(1)),
    (CanonicalAxis::RightStickX, AxisBinding::new(2)),
    (CanonicalAxis::RightStickY, AxisBinding::new(3)),
    (CanonicalAxis::DpadX, AxisBinding::new(4)),
    (CanonicalAxis::DpadY, AxisBinding::new(5)),
];

// A / Cross on the bottom confirms, B / Circle on the right goes back.
const SOUTH_CONFIRM_BUTTONS: &[(CanonicalAction, usize)] = &[
    (CanonicalAction::Confirm, 0),
    (CanonicalAction::Back, 1),
    (CanonicalAction::OptionPrimary, 2),
    (CanonicalAction::OptionSecondary, 3),
    (CanonicalAction::LeftBumper, 4),
    (CanonicalAction::RightBumper, 5),
    (CanonicalAction::LeftTrigger, 6),
    (CanonicalAction::RightTrigger, 7),
    (CanonicalAction::Select, 8),
    (CanonicalAction::Start, 9),
    (CanonicalAction::LeftStickClick, 10),
    (CanonicalAction::RightStickClick, 11),
    (CanonicalAction::DpadUp, 12),
    (CanonicalAction::DpadDown, 13),
    (CanonicalAction::DpadLeft, 14),
    (CanonicalAction::DpadRight, 15),
    (CanonicalAction::Home, 16),
];

// Nintendo prints A on the right and B on the bottom; X and Y swap the same way.
const EAST_CONFIRM_BUTTONS: &[(CanonicalAction, usize)] = &[
    (CanonicalAction::Confirm, 1),
    (CanonicalAction::Back, 0),
    (CanonicalAction::OptionPrimary, 3),
    (CanonicalAction::OptionSecondary, 2),
    (CanonicalAction::LeftBumper, 4),
    (CanonicalAction::RightBumper, 5),
    (CanonicalAction::LeftTrigger, 6),
    (CanonicalAction::RightTrigger, 7),
    (CanonicalAction::Select, 8),
    (CanonicalAction::Start, 9),
    (CanonicalAction::LeftStickClick, 10),
    (CanonicalAction::RightStickClick, 11),
    (CanonicalAction::DpadUp, 12),
    (CanonicalAction::DpadDown, 13),
    (CanonicalAction::DpadLeft, 14),
    (CanonicalAction::DpadRight, 15),
    (CanonicalAction::Home, 16),
];

pub const XBOX_LAYOUT: FamilyLayout = FamilyLayout {
    family: DeviceFamily::Xbox,
    buttons: SOUTH_CONFIRM_BUTTONS,
    axes: STANDARD_AXES,
};

pub const PLAYSTATION_LAYOUT: FamilyLayout = FamilyLayout {
    family: DeviceFamily::PlayStation,
    buttons: SOUTH_CONFIRM_BUTTONS,
    axes: STANDARD_AXES,
};

pub const NINTENDO_LAYOUT: FamilyLayout = FamilyLayout {
    family: DeviceFamily::Nintendo,
    buttons: EAST_CONFIRM_BUTTONS,
    axes: STANDARD_AXES,
};

pub const STEAM_DECK_LAYOUT: FamilyLayout = FamilyLayout {
    family: DeviceFamily::SteamDeck,
    buttons: SOUTH_CONFIRM_BUTTONS,
    axes: STANDARD_AXES,
};

pub const GENERIC_LAYOUT: FamilyLayout = FamilyLayout {
    family: DeviceFamily::Generic,
    buttons: SOUTH_CONFIRM_BUTTONS,
    axes: STANDARD_AXES,
};

/// Default table for a family
pub fn default_layout(family: DeviceFamily) -> &'static FamilyLayout {
    match family {
        DeviceFamily::Xbox => &XBOX_LAYOUT,
        DeviceFamily::PlayStation => &PLAYSTATION_LAYOUT,
        DeviceFamily::Nintendo => &NINTENDO_LAYOUT,
        DeviceFamily::SteamDeck => &STEAM_DECK_LAYOUT,
        DeviceFamily::Generic => &GENERIC_LAYOUT,
    }
}
