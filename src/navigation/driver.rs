use super::controller::{NavOutcome, NavSignal, NavigationController};
use super::direction::resolve_direction;
use super::repeat::RepeatTimer;
use crate::config::NavSettings;
use crate::controller::device::TickSnapshot;
use crate::mapping::CanonicalAction;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Feeds tick snapshots into the navigation controller.
///
/// Each device gets its own repeat timer; confirm and back fire on their
/// press edge only.
#[derive(Debug)]
pub struct NavigationDriver {
    controller: NavigationController,
    timers: HashMap<usize, RepeatTimer>,
    repeat_delay: Duration,
    repeat_interval: Duration,
}

impl NavigationDriver {
    pub fn new(
        controller: NavigationController,
        repeat_delay: Duration,
        repeat_interval: Duration,
    ) -> Self {
        Self {
            controller,
            timers: HashMap::new(),
            repeat_delay,
            repeat_interval,
        }
    }

    pub fn from_settings(settings: &NavSettings) -> Self {
        Self::new(
            NavigationController::new(settings.guard_window()),
            settings.repeat_delay(),
            settings.repeat_interval(),
        )
    }

    pub fn controller(&self) -> &NavigationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut NavigationController {
        &mut self.controller
    }

    pub fn set_timing(&mut self, repeat_delay: Duration, repeat_interval: Duration) {
        self.repeat_delay = repeat_delay;
        self.repeat_interval = repeat_interval;
        for timer in self.timers.values_mut() {
            timer.set_timing(repeat_delay, repeat_interval);
        }
    }

    pub fn on_tick(&mut self, snapshot: &TickSnapshot) -> Vec<NavOutcome> {
        let mut outcomes = Vec::new();

        for device in &snapshot.devices {
            if !device.connected {
                self.timers.remove(&device.index);
                continue;
            }

            let (delay, interval) = (self.repeat_delay, self.repeat_interval);
            let timer = self
                .timers
                .entry(device.index)
                .or_insert_with(|| RepeatTimer::new(delay, interval));

            let mut signals = Vec::new();
            if let Some(dir) = timer.update(resolve_direction(device), snapshot.now) {
                signals.push(NavSignal::Direction(dir));
            }
            if device.just_pressed(CanonicalAction::Confirm) {
                signals.push(NavSignal::Confirm);
            }
            if device.just_pressed(CanonicalAction::Back) {
                signals.push(NavSignal::Back);
            }

            for signal in signals {
                let outcome = self.controller.handle(signal, snapshot.now);
                debug!("Device {} {:?} -> {:?}", device.index, signal, outcome);
                outcomes.push(outcome);
            }
        }

        outcomes
    }
}
