use crate::mapping::axis::MAX_DEADZONE;
use crate::persistence::{self, ConfigStore, StoreError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Store key holding the [`NavSettings`] table
pub const SETTINGS_KEY: &str = "settings";

/// Runtime-tunable timing and sensitivity values.
///
/// Missing fields in a stored table fall back to the defaults field by field.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NavSettings {
    /// Analog deadzone as a fraction, clamped to `0.0..=0.5`
    pub deadzone: f32,

    /// Time a direction has to be held before it starts repeating
    pub repeat_delay_ms: u64,

    /// Time between repeated navigation ticks once repeating
    pub repeat_interval_ms: u64,

    /// Confirm suppression window after a region gains focus
    pub guard_window_ms: u64,

    /// Target frame pacing for the poll loop
    pub frame_interval_ms: u64,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            deadzone: 0.15,
            repeat_delay_ms: 200,
            repeat_interval_ms: 100,
            guard_window_ms: 200,
            frame_interval_ms: 16, // ~60Hz
        }
    }
}

impl NavSettings {
    /// Loads settings from the store.
    ///
    /// Never fails: an unreadable or malformed entry is logged and replaced by
    /// the defaults.
    pub fn load(store: &dyn ConfigStore) -> Self {
        match persistence::get_as::<NavSettings>(store, SETTINGS_KEY) {
            Ok(Some(settings)) => {
                debug!("Loaded navigation settings: {:?}", settings);
                settings.sanitized()
            }
            Ok(None) => {
                info!("No stored navigation settings, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load navigation settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn ConfigStore) -> Result<(), StoreError> {
        persistence::set_as(store, SETTINGS_KEY, self)
    }

    /// Pulls every value into its valid range
    pub fn sanitized(mut self) -> Self {
        self.deadzone = if self.deadzone.is_finite() {
            self.deadzone.clamp(0.0, MAX_DEADZONE)
        } else {
            Self::default().deadzone
        };
        self.repeat_interval_ms = self.repeat_interval_ms.max(1);
        self.frame_interval_ms = self.frame_interval_ms.max(1);
        self
    }

    pub fn repeat_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_delay_ms)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    pub fn guard_window(&self) -> Duration {
        Duration::from_millis(self.guard_window_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn missing_settings_use_defaults() {
        let store = MemoryStore::new();
        assert_eq!(NavSettings::load(&store), NavSettings::default());
    }

    #[test]
    fn saved_settings_round_trip_through_store() {
        let store = MemoryStore::new();
        let settings = NavSettings {
            deadzone: 0.25,
            repeat_delay_ms: 350,
            ..Default::default()
        };
        settings.save(&store).unwrap();

        assert_eq!(NavSettings::load(&store), settings);
    }

    #[test]
    fn partial_table_fills_remaining_fields_with_defaults() {
        let store = MemoryStore::new();
        let mut table = toml::Table::new();
        table.insert("repeat_interval_ms".into(), toml::Value::Integer(80));
        store.set(SETTINGS_KEY, toml::Value::Table(table)).unwrap();

        let settings = NavSettings::load(&store);
        assert_eq!(settings.repeat_interval_ms, 80);
        assert_eq!(settings.repeat_delay_ms, 200);
    }

    #[test]
    fn out_of_range_deadzone_is_clamped() {
        let store = MemoryStore::new();
        let settings = NavSettings {
            deadzone: 0.9,
            ..Default::default()
        };
        settings.save(&store).unwrap();

        assert_eq!(NavSettings::load(&store).deadzone, MAX_DEADZONE);
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults() {
        let store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, toml::Value::String("garbage".into()))
            .unwrap();
        assert_eq!(NavSettings::load(&store), NavSettings::default());
    }
}
