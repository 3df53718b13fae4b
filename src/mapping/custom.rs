//! Custom per-device mappings and the store that owns them.
//!
//! A [`CustomMapping`] only lists the entries the user actually rebound; every
//! action or axis it leaves out keeps the family default. The [`RemapStore`]
//! caches records in memory and mirrors them into the configuration store under
//! `mapping.<device id>`.
//!
//! Writes always replace the whole record. Writers queue on a separate writer
//! lock, so two rebinds can never interleave into a half-merged record, while
//! the cache lock is only taken for the in-memory swap. Readers on the poll
//! path see either the previous record or the new one.

use super::action::{AxisBinding, AxisSign, CanonicalAction, CanonicalAxis};
use super::error::MappingError;
use crate::persistence::{ConfigStore, StoreError};
use crate::try_lock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Store key prefix for per-device records
pub const MAPPING_KEY_PREFIX: &str = "mapping.";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ButtonOverride {
    pub action: CanonicalAction,
    pub index: usize,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct AxisOverride {
    pub axis: CanonicalAxis,
    pub index: usize,
    #[serde(default)]
    pub sign: AxisSign,
}

/// User overrides for one device
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomMapping {
    #[serde(default)]
    pub buttons: Vec<ButtonOverride>,
    #[serde(default)]
    pub axes: Vec<AxisOverride>,
}

impl CustomMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `action` to a raw button, replacing any earlier override for it
    pub fn bind_button(&mut self, action: CanonicalAction, index: usize) -> &mut Self {
        self.buttons.retain(|b| b.action != action);
        self.buttons.push(ButtonOverride { action, index });
        self
    }

    pub fn bind_axis(&mut self, axis: CanonicalAxis, binding: AxisBinding) -> &mut Self {
        self.axes.retain(|a| a.axis != axis);
        self.axes.push(AxisOverride {
            axis,
            index: binding.index,
            sign: binding.sign,
        });
        self
    }

    pub fn button_index(&self, action: CanonicalAction) -> Option<usize> {
        self.buttons
            .iter()
            .find(|b| b.action == action)
            .map(|b| b.index)
    }

    pub fn axis_binding(&self, axis: CanonicalAxis) -> Option<AxisBinding> {
        self.axes.iter().find(|a| a.axis == axis).map(|a| AxisBinding {
            index: a.index,
            sign: a.sign,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty() && self.axes.is_empty()
    }
}

/// Owner of every custom mapping, backed by a [`ConfigStore`]
#[derive(Debug)]
pub struct RemapStore {
    records: RwLock<HashMap<String, CustomMapping>>,
    writer: Mutex<()>,
    backend: Arc<dyn ConfigStore>,
}

impl RemapStore {
    pub fn new(backend: Arc<dyn ConfigStore>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            writer: Mutex::new(()),
            backend,
        }
    }

    fn key(device_id: &str) -> String {
        format!("{MAPPING_KEY_PREFIX}{device_id}")
    }

    // Never taken on the poll path; a poisoned guard protects no data
    fn writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn swap_record(
        &self,
        device_id: &str,
        mapping: Option<CustomMapping>,
    ) -> Result<(), StoreError> {
        let mut records = try_lock!(@write_lock_retry, self.records)?;
        match mapping {
            Some(m) => records.insert(device_id.to_string(), m),
            None => records.remove(device_id),
        };
        Ok(())
    }

    /// Pulls the record for `device_id` from the backend into the cache.
    ///
    /// Returns the loaded record; an absent or empty record is `None` and
    /// clears any cached entry.
    pub fn load(&self, device_id: &str) -> Result<Option<CustomMapping>, MappingError> {
        let _writer = self.writer();
        let value = self.backend.get(&Self::key(device_id))?;
        let mapping = match value {
            Some(value) => {
                let mapping = value.try_into::<CustomMapping>().map_err(|e| {
                    MappingError::InvalidRecord {
                        device: device_id.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Some(mapping).filter(|m| !m.is_empty())
            }
            None => None,
        };

        if mapping.is_some() {
            info!("Loaded custom mapping for {}", device_id);
        }
        self.swap_record(device_id, mapping.clone())?;
        Ok(mapping)
    }

    /// Cached record for `device_id`
    pub fn get(&self, device_id: &str) -> Option<CustomMapping> {
        self.with_mapping(device_id, |m| m.cloned())
    }

    /// Runs `f` against the cached record without cloning it.
    ///
    /// A read lock that cannot be acquired is treated as "no custom mapping"
    /// so the caller falls back to defaults instead of stalling a frame.
    pub fn with_mapping<R>(
        &self,
        device_id: &str,
        f: impl FnOnce(Option<&CustomMapping>) -> R,
    ) -> R {
        match try_lock!(@read_lock_retry, self.records) {
            Ok(records) => f(records.get(device_id)),
            Err(e) => {
                warn!("Custom mappings unavailable for {}: {}", device_id, e);
                f(None)
            }
        }
    }

    /// Replaces the whole record for `device_id`.
    ///
    /// The backend write happens first and outside the cache lock; on failure
    /// the cached record is left as it was and the error is returned.
    pub fn set(&self, device_id: &str, mapping: CustomMapping) -> Result<(), MappingError> {
        let _writer = self.writer();

        let value = toml::Value::try_from(&mapping).map_err(|e| StoreError::Format {
            key: Self::key(device_id),
            reason: e.to_string(),
        })?;
        self.backend.set(&Self::key(device_id), value)?;

        debug!("Stored custom mapping for {}: {:?}", device_id, mapping);
        self.swap_record(device_id, Some(mapping).filter(|m| !m.is_empty()))?;
        Ok(())
    }

    /// Drops the record for `device_id`, returning whether one existed
    pub fn remove(&self, device_id: &str) -> Result<bool, MappingError> {
        let existed = self.with_mapping(device_id, |m| m.is_some());
        self.set(device_id, CustomMapping::default())?;
        Ok(existed)
    }

    pub fn len(&self) -> usize {
        self.with_all(|records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_all<R>(&self, f: impl FnOnce(&HashMap<String, CustomMapping>) -> R) -> R {
        match try_lock!(@read_lock_retry, self.records) {
            Ok(records) => f(&records),
            Err(_) => f(&HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    const PAD: &str = "Xbox Wireless Controller";

    fn store() -> (Arc<MemoryStore>, RemapStore) {
        let backend = Arc::new(MemoryStore::new());
        let remaps = RemapStore::new(backend.clone());
        (backend, remaps)
    }

    #[test]
    fn bind_button_replaces_previous_override() {
        let mut mapping = CustomMapping::new();
        mapping
            .bind_button(CanonicalAction::Confirm, 3)
            .bind_button(CanonicalAction::Confirm, 2);
        assert_eq!(mapping.buttons.len(), 1);
        assert_eq!(mapping.button_index(CanonicalAction::Confirm), Some(2));
        assert_eq!(mapping.button_index(CanonicalAction::Back), None);
    }

    #[test]
    fn set_persists_and_reload_reads_it_back() {
        let (backend, remaps) = store();
        let mut mapping = CustomMapping::new();
        mapping
            .bind_button(CanonicalAction::Confirm, 1)
            .bind_axis(CanonicalAxis::LeftStickY, AxisBinding::inverted(1));
        remaps.set(PAD, mapping.clone()).unwrap();

        let fresh = RemapStore::new(backend);
        assert!(fresh.get(PAD).is_none());
        assert_eq!(fresh.load(PAD).unwrap(), Some(mapping.clone()));
        assert_eq!(fresh.get(PAD), Some(mapping));
    }

    #[test]
    fn failed_write_keeps_previous_record() {
        let (backend, remaps) = store();
        let mut first = CustomMapping::new();
        first.bind_button(CanonicalAction::Back, 2);
        remaps.set(PAD, first.clone()).unwrap();

        backend.set_fail_writes(true);
        let mut second = CustomMapping::new();
        second.bind_button(CanonicalAction::Back, 3);
        let err = remaps.set(PAD, second).unwrap_err();
        assert!(matches!(err, MappingError::Store(StoreError::Write(_))));

        assert_eq!(remaps.get(PAD), Some(first));
    }

    #[test]
    fn set_replaces_whole_record() {
        let (_backend, remaps) = store();
        let mut first = CustomMapping::new();
        first
            .bind_button(CanonicalAction::Back, 2)
            .bind_button(CanonicalAction::Confirm, 3);
        remaps.set(PAD, first).unwrap();

        let mut second = CustomMapping::new();
        second.bind_button(CanonicalAction::Start, 8);
        remaps.set(PAD, second.clone()).unwrap();

        let stored = remaps.get(PAD).unwrap();
        assert_eq!(stored, second);
        assert_eq!(stored.button_index(CanonicalAction::Back), None);
    }

    #[test]
    fn remove_clears_cache_and_backend() {
        let (backend, remaps) = store();
        let mut mapping = CustomMapping::new();
        mapping.bind_button(CanonicalAction::Home, 9);
        remaps.set(PAD, mapping).unwrap();

        assert!(remaps.remove(PAD).unwrap());
        assert!(remaps.get(PAD).is_none());
        assert!(remaps.is_empty());

        let fresh = RemapStore::new(backend);
        assert_eq!(fresh.load(PAD).unwrap(), None);
    }

    // Backend whose writes take a while and announce when they start
    #[derive(Debug)]
    struct SlowStore {
        inner: MemoryStore,
        writing: AtomicBool,
    }

    impl ConfigStore for SlowStore {
        fn get(&self, key: &str) -> Result<Option<toml::Value>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: toml::Value) -> Result<(), StoreError> {
            self.writing.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(150));
            self.inner.set(key, value)
        }
    }

    #[test]
    fn readers_see_old_or_new_record_during_slow_write() {
        let backend = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            writing: AtomicBool::new(false),
        });
        let remaps = Arc::new(RemapStore::new(backend.clone()));

        let mut old = CustomMapping::new();
        old.bind_button(CanonicalAction::Confirm, 3);
        remaps.set(PAD, old.clone()).unwrap();
        backend.writing.store(false, Ordering::SeqCst);

        let mut new = CustomMapping::new();
        new.bind_button(CanonicalAction::Confirm, 2);
        let writer = {
            let remaps = remaps.clone();
            let new = new.clone();
            thread::spawn(move || remaps.set(PAD, new))
        };

        while !backend.writing.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        let mut reads = 0;
        while !writer.is_finished() {
            let seen = remaps.with_mapping(PAD, |m| m.cloned());
            assert!(seen == Some(old.clone()) || seen == Some(new.clone()));
            reads += 1;
        }
        writer.join().unwrap().unwrap();

        assert!(reads > 0);
        assert_eq!(remaps.get(PAD), Some(new));
    }

    #[test]
    fn malformed_record_is_reported() {
        let (backend, remaps) = store();
        backend
            .set(&format!("{MAPPING_KEY_PREFIX}{PAD}"), toml::Value::Integer(4))
            .unwrap();

        let err = remaps.load(PAD).unwrap_err();
        assert!(matches!(err, MappingError::InvalidRecord { .. }));
    }
}
