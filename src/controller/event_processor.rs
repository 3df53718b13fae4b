//! Per-tick device tracking.
//!
//! [`DeviceTracker::process`] turns one raw snapshot into a [`TickSnapshot`]:
//! classify, normalize, apply the deadzone and derive `just_pressed` edges.
//! Edges are computed for every device against the previous buffers first,
//! and only then are the buffers overwritten, so no device ever compares
//! against a half-updated tick.

use super::device::{ButtonState, ConnectionEvent, Device, RawDeviceState, TickSnapshot};
use super::listeners::{ListenerRegistry, Subscription};
use crate::mapping::{classify, CanonicalAction, CanonicalAxis, Deadzone, DeviceFamily, Normalizer};
use chrono::Local;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info};

// Buttons as they were at the end of the last tick
#[derive(Debug, Clone)]
struct PreviousState {
    id: String,
    family: DeviceFamily,
    pressed: Vec<bool>,
}

#[derive(Debug)]
pub struct DeviceTracker {
    normalizer: Normalizer,
    deadzone: Deadzone,
    devices: BTreeMap<usize, Device>,
    previous: HashMap<usize, PreviousState>,
    tick: u64,
    tick_listeners: ListenerRegistry<TickSnapshot>,
    connection_listeners: ListenerRegistry<ConnectionEvent>,
}

impl DeviceTracker {
    pub fn new(normalizer: Normalizer, deadzone: Deadzone) -> Self {
        Self {
            normalizer,
            deadzone,
            devices: BTreeMap::new(),
            previous: HashMap::new(),
            tick: 0,
            tick_listeners: ListenerRegistry::new(),
            connection_listeners: ListenerRegistry::new(),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn deadzone(&self) -> Deadzone {
        self.deadzone
    }

    /// Takes effect from the next tick
    pub fn set_deadzone(&mut self, deadzone: Deadzone) {
        info!("Deadzone set to {:.2}", deadzone.value());
        self.deadzone = deadzone;
    }

    pub fn subscribe_ticks<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&TickSnapshot) + Send + 'static,
    {
        self.tick_listeners.subscribe(listener)
    }

    pub fn subscribe_connections<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&ConnectionEvent) + Send + 'static,
    {
        self.connection_listeners.subscribe(listener)
    }

    /// Connected devices as of the last tick
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn device(&self, index: usize) -> Option<&Device> {
        self.devices.get(&index)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Runs one tick over `raw` and publishes the result to tick listeners
    pub fn process(&mut self, raw: Vec<RawDeviceState>, now: Instant) -> TickSnapshot {
        self.tick += 1;
        let mut events = Vec::new();
        let mut computed: BTreeMap<usize, Device> = BTreeMap::new();

        // Phase 1: compute every device against the untouched previous buffers
        for state in &raw {
            let previous = match self.previous.get(&state.index) {
                Some(prev) if prev.id == state.id => Some(prev),
                Some(prev) => {
                    // Different device took over the slot
                    info!(
                        "Controller {} replaced at index {} by {}",
                        prev.id, state.index, state.id
                    );
                    events.push(ConnectionEvent::Disconnected {
                        index: state.index,
                        id: prev.id.clone(),
                    });
                    None
                }
                None => None,
            };

            let family = match previous {
                Some(prev) => prev.family,
                None => {
                    let family = classify(&state.id);
                    info!(
                        "Controller connected at index {}: {} ({})",
                        state.index, state.id, family
                    );
                    self.normalizer.prepare(&state.id);
                    events.push(ConnectionEvent::Connected {
                        index: state.index,
                        id: state.id.clone(),
                        family,
                    });
                    family
                }
            };

            let was_pressed = |i: usize| {
                previous
                    .and_then(|prev| prev.pressed.get(i).copied())
                    .unwrap_or(false)
            };
            let device = self.build_device(state, family, was_pressed);
            computed.insert(state.index, device);
        }

        // Departed devices show up once more, flagged, then disappear
        let gone: Vec<Device> = self
            .devices
            .keys()
            .filter(|index| !computed.contains_key(*index))
            .filter_map(|&index| self.last_known(index))
            .collect();

        // Phase 2: overwrite buffers now that every edge is known
        self.previous.clear();
        for device in computed.values() {
            self.previous.insert(
                device.index,
                PreviousState {
                    id: device.id.clone(),
                    family: device.family,
                    pressed: device.buttons.iter().map(|b| b.pressed).collect(),
                },
            );
        }
        self.devices = computed.clone();

        for device in gone {
            info!(
                "Controller disconnected at index {}: {}",
                device.index, device.id
            );
            events.push(ConnectionEvent::Disconnected {
                index: device.index,
                id: device.id.clone(),
            });
            computed.insert(device.index, device);
        }

        let snapshot = TickSnapshot {
            tick: self.tick,
            now,
            captured_at: Local::now(),
            devices: computed.into_values().collect(),
        };
        debug!(
            "Tick {} with {} devices",
            snapshot.tick,
            snapshot.devices.len()
        );

        for event in &events {
            self.connection_listeners.notify(event);
        }
        self.tick_listeners.notify(&snapshot);
        snapshot
    }

    // Final view of a departed device: nothing can be a fresh edge anymore
    fn last_known(&self, index: usize) -> Option<Device> {
        let mut device = self.devices.get(&index)?.clone();
        device.connected = false;
        for button in device.buttons.iter_mut() {
            button.just_pressed = false;
        }
        for state in device.actions.values_mut() {
            state.just_pressed = false;
        }
        Some(device)
    }

    fn build_device(
        &self,
        state: &RawDeviceState,
        family: DeviceFamily,
        was_pressed: impl Fn(usize) -> bool,
    ) -> Device {
        let buttons: Vec<ButtonState> = state
            .buttons
            .iter()
            .enumerate()
            .map(|(i, raw)| ButtonState {
                pressed: raw.pressed,
                just_pressed: raw.pressed && !was_pressed(i),
                value: raw.value,
            })
            .collect();

        let axes: Vec<f32> = state
            .axes
            .iter()
            .map(|&value| self.deadzone.apply(value))
            .collect();

        let layout = self.normalizer.resolve(&state.id, family);

        let actions = CanonicalAction::ALL
            .into_iter()
            .filter_map(|action| {
                let index = layout.button_index(action)?;
                buttons.get(index).map(|b| (action, *b))
            })
            .collect();

        let canonical_axes = CanonicalAxis::ALL
            .into_iter()
            .filter_map(|axis| {
                let binding = layout.axis_binding(axis)?;
                axes.get(binding.index).map(|&v| (axis, binding.apply(v)))
            })
            .collect();

        Device {
            id: state.id.clone(),
            index: state.index,
            name: state.name.clone(),
            family,
            connected: true,
            buttons,
            axes,
            actions,
            canonical_axes,
        }
    }
}
