//! Raw index → canonical action resolution.
//!
//! The effective table for a device is the family default with the device's
//! custom overrides laid on top, entry by entry. [`Normalizer::resolve`] builds
//! that table once so a tick can look up every button without touching the
//! remap store again.

use super::action::{default_layout, AxisBinding, CanonicalAction, CanonicalAxis};
use super::custom::RemapStore;
use super::error::MappingError;
use super::family::DeviceFamily;
use std::sync::Arc;
use tracing::{debug, warn};

/// Effective button/axis table for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub family: DeviceFamily,
    buttons: [Option<usize>; CanonicalAction::COUNT],
    axes: [Option<AxisBinding>; CanonicalAxis::COUNT],
    customized: bool,
}

impl ResolvedLayout {
    pub fn button_index(&self, action: CanonicalAction) -> Option<usize> {
        self.buttons[action.slot()]
    }

    pub fn axis_binding(&self, axis: CanonicalAxis) -> Option<AxisBinding> {
        self.axes[axis.slot()]
    }

    /// Canonical action bound to `raw_index`.
    ///
    /// When overrides make two actions share an index, the one declared first
    /// in [`CanonicalAction::ALL`] wins.
    pub fn action_for(&self, raw_index: usize) -> Option<CanonicalAction> {
        CanonicalAction::ALL
            .into_iter()
            .find(|action| self.buttons[action.slot()] == Some(raw_index))
    }

    pub fn is_customized(&self) -> bool {
        self.customized
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    remaps: Arc<RemapStore>,
}

impl Normalizer {
    pub fn new(remaps: Arc<RemapStore>) -> Self {
        Self { remaps }
    }

    pub fn remaps(&self) -> &Arc<RemapStore> {
        &self.remaps
    }

    /// Makes sure a freshly connected device's stored mapping is cached.
    ///
    /// Store failures are logged and the device runs on its family default.
    pub fn prepare(&self, device_id: &str) {
        if self.remaps.get(device_id).is_some() {
            return;
        }
        match self.remaps.load(device_id) {
            Ok(Some(_)) => debug!("Custom mapping active for {}", device_id),
            Ok(None) => debug!("No custom mapping for {}, using family default", device_id),
            Err(MappingError::Store(e)) => {
                warn!("Could not load mapping for {}: {}", device_id, e)
            }
            Err(e) => warn!("Ignoring stored mapping for {}: {}", device_id, e),
        }
    }

    pub fn resolve(&self, device_id: &str, family: DeviceFamily) -> ResolvedLayout {
        let defaults = default_layout(family);

        self.remaps.with_mapping(device_id, |custom| {
            let mut buttons = [None; CanonicalAction::COUNT];
            for action in CanonicalAction::ALL {
                buttons[action.slot()] = custom
                    .and_then(|c| c.button_index(action))
                    .or_else(|| defaults.button_index(action));
            }

            let mut axes = [None; CanonicalAxis::COUNT];
            for axis in CanonicalAxis::ALL {
                axes[axis.slot()] = custom
                    .and_then(|c| c.axis_binding(axis))
                    .or_else(|| defaults.axis_binding(axis));
            }

            ResolvedLayout {
                family,
                buttons,
                axes,
                customized: custom.is_some(),
            }
        })
    }

    pub fn action_for_button(
        &self,
        device_id: &str,
        family: DeviceFamily,
        raw_index: usize,
    ) -> Option<CanonicalAction> {
        self.resolve(device_id, family).action_for(raw_index)
    }

    pub fn button_for_action(
        &self,
        device_id: &str,
        family: DeviceFamily,
        action: CanonicalAction,
    ) -> Option<usize> {
        self.resolve(device_id, family).button_index(action)
    }

    pub fn axis_binding(
        &self,
        device_id: &str,
        family: DeviceFamily,
        axis: CanonicalAxis,
    ) -> Option<AxisBinding> {
        self.resolve(device_id, family).axis_binding(axis)
    }
}
