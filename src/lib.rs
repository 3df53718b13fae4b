//! Controller input normalization and navigation focus engine.
//!
//! Polls heterogeneous gamepads once per frame, maps every family onto one
//! canonical action set, turns sticks and d-pads into discrete directions and
//! routes direction/confirm/back signals to whichever UI region holds focus.
//! Keyboard shortcuts run alongside through [`shortcuts::ShortcutChannel`].

pub mod config;
pub mod controller;
pub mod mapping;
pub mod navigation;
pub mod persistence;
pub mod shortcuts;

pub use config::NavSettings;
pub use controller::{ControllerError, ControllerHandle};
