use super::direction::Direction;
use std::time::{Duration, Instant};

/// Turns a held direction into navigation ticks: one immediately, then one
/// per `interval` once `initial_delay` has passed.
///
/// Holding for `D` yields `1 + floor(max(0, D - delay) / interval)` ticks.
#[derive(Debug, Clone)]
pub struct RepeatTimer {
    initial_delay: Duration,
    interval: Duration,
    held: Option<Held>,
}

#[derive(Debug, Clone, Copy)]
struct Held {
    direction: Direction,
    next_fire: Instant,
}

impl RepeatTimer {
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            // zero would fire every update
            interval: interval.max(Duration::from_millis(1)),
            held: None,
        }
    }

    /// Feeds this tick's resolved direction; returns the direction to act on,
    /// at most once per call.
    pub fn update(&mut self, direction: Option<Direction>, now: Instant) -> Option<Direction> {
        let Some(direction) = direction else {
            self.held = None;
            return None;
        };

        match self.held.as_mut() {
            Some(held) if held.direction == direction => {
                if now < held.next_fire {
                    return None;
                }
                held.next_fire += self.interval;
                // Long stall: don't burst to catch up
                if held.next_fire <= now {
                    held.next_fire = now + self.interval;
                }
                Some(direction)
            }
            _ => {
                self.held = Some(Held {
                    direction,
                    next_fire: now + self.initial_delay + self.interval,
                });
                Some(direction)
            }
        }
    }

    pub fn reset(&mut self) {
        self.held = None;
    }

    pub fn held(&self) -> Option<Direction> {
        self.held.map(|h| h.direction)
    }

    pub fn set_timing(&mut self, initial_delay: Duration, interval: Duration) {
        self.initial_delay = initial_delay;
        self.interval = interval.max(Duration::from_millis(1));
    }
}
