//! # Persistence Module
//!
//! The configuration store is the one piece of durable cross-session state the
//! navigation core touches. It is used to load and save custom per-device
//! mappings, the global deadzone, the repeat timing and the keyboard shortcut
//! bindings.
//!
//! ## Contract
//! Every backend implements [`ConfigStore`]: a flat `get(key)` / `set(key, value)`
//! surface over TOML values. Failures surface as [`StoreError`] to whoever made
//! the call. The poll loop never calls into the store on its own, so a broken
//! backend cannot stop polling or navigation.
//!
//! ## Backends
//! - [`file_store::TomlFileStore`] keeps one TOML document under the user config
//!   directory and rewrites it on every `set`.
//! - [`MemoryStore`] keeps everything in memory; it is what tests and embedders
//!   without a disk use.

pub mod file_store;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

pub use file_store::TomlFileStore;

/// Errors raised by configuration store backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read config store: {0}")]
    Read(String),

    #[error("Failed to write config store: {0}")]
    Write(String),

    #[error("Invalid value for key {key}: {reason}")]
    Format { key: String, reason: String },

    #[error("Config store lock timed out")]
    LockTimeout,

    #[error("Config store unavailable: {0}")]
    Unavailable(String),
}

/// Flat key/value configuration store.
///
/// Keys are free-form strings (`settings`, `shortcuts`, `mapping.<device id>`).
/// Values are whole TOML values; a `set` always replaces the stored value for
/// that key entirely.
pub trait ConfigStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<toml::Value>, StoreError>;

    fn set(&self, key: &str, value: toml::Value) -> Result<(), StoreError>;
}

/// Reads `key` and deserializes it into `T`.
pub fn get_as<T: DeserializeOwned>(
    store: &dyn ConfigStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(value) => value
            .try_into::<T>()
            .map(Some)
            .map_err(|e| StoreError::Format {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Serializes `value` and writes it under `key`.
pub fn set_as<T: Serialize>(
    store: &dyn ConfigStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = toml::Value::try_from(value).map_err(|e| StoreError::Format {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, value)
}

/// In-memory store. Writes can be made to fail to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<toml::Table>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail with [`StoreError::Write`]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<toml::Value>, StoreError> {
        let table = self
            .table
            .lock()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(table.get(key).cloned())
    }

    fn set(&self, key: &str, value: toml::Value) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write(format!("writes disabled for key {key}")));
        }
        let mut table = self
            .table
            .lock()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        debug!("Memory store set {}", key);
        table.insert(key.to_string(), value);
        Ok(())
    }
}

/// Bounded retry around `try_read` / `try_write` on a `tokio::sync::RwLock`.
///
/// Five attempts, ten milliseconds apart; gives up with
/// [`StoreError::LockTimeout`] instead of blocking forever.
#[macro_export]
macro_rules! try_lock {
    (@write_lock_retry, $lock:expr) => {{
        let mut attempts = 0;
        const MAX_ATTEMPTS: usize = 5;

        loop {
            match $lock.try_write() {
                Ok(guard) => break Ok(guard),
                Err(e) => {
                    attempts += 1;
                    tracing::warn!(
                        "Write lock blocked: {} (attempt {}/{})",
                        e,
                        attempts,
                        MAX_ATTEMPTS
                    );

                    if attempts >= MAX_ATTEMPTS {
                        break Err($crate::persistence::StoreError::LockTimeout);
                    }

                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }
    }};

    (@read_lock_retry, $lock:expr) => {{
        let mut attempts = 0;
        const MAX_ATTEMPTS: usize = 5;

        loop {
            match $lock.try_read() {
                Ok(guard) => break Ok(guard),
                Err(e) => {
                    attempts += 1;
                    tracing::warn!(
                        "Read lock blocked: {} (attempt {}/{})",
                        e,
                        attempts,
                        MAX_ATTEMPTS
                    );

                    if attempts >= MAX_ATTEMPTS {
                        break Err($crate::persistence::StoreError::LockTimeout);
                    }

                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn memory_store_returns_none_for_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn typed_helpers_store_and_load_structs() {
        let store = MemoryStore::new();
        let sample = Sample {
            name: "pad".to_string(),
            count: 3,
        };
        set_as(&store, "sample", &sample).unwrap();

        let loaded: Option<Sample> = get_as(&store, "sample").unwrap();
        assert_eq!(loaded, Some(sample));
    }

    #[test]
    fn failing_writes_surface_as_errors_and_keep_old_value() {
        let store = MemoryStore::new();
        store.set("deadzone", toml::Value::Float(0.1)).unwrap();
        store.set_fail_writes(true);

        let err = store.set("deadzone", toml::Value::Float(0.3)).unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
        assert_eq!(
            store.get("deadzone").unwrap(),
            Some(toml::Value::Float(0.1))
        );
    }

    #[test]
    fn get_as_reports_format_errors_with_key() {
        let store = MemoryStore::new();
        store
            .set("sample", toml::Value::String("not a table".into()))
            .unwrap();

        let err = get_as::<Sample>(&store, "sample").unwrap_err();
        match err {
            StoreError::Format { key, .. } => assert_eq!(key, "sample"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn try_lock_macro_times_out_on_held_write_lock() {
        let lock = tokio::sync::RwLock::new(1u8);
        let _held = lock.try_write().unwrap();

        let result: Result<_, StoreError> = try_lock!(@read_lock_retry, lock);
        assert!(matches!(result, Err(StoreError::LockTimeout)));
    }
}
