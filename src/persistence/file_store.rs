//! TOML-file backed configuration store.
//!
//! The whole store is one TOML document. Every `set` serializes the full table
//! into a temporary sibling file and renames it over the original, so a crash
//! mid-write leaves the previous document intact.

use super::{ConfigStore, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "padnav";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    table: Mutex<toml::Table>,
}

impl TomlFileStore {
    /// Opens the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let table = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| StoreError::Read(format!("{}: {}", path.display(), e)))?;
            content
                .parse::<toml::Table>()
                .map_err(|e| StoreError::Read(format!("{}: {}", path.display(), e)))?
        } else {
            info!(
                "No config file at {}, starting with defaults",
                path.display()
            );
            toml::Table::new()
        };

        debug!("Opened config store {} with {} keys", path.display(), table.len());
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Opens `<user config dir>/padnav/settings.toml`.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf, StoreError> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| StoreError::Unavailable("no user config directory".to_string()))?;
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        Ok(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, table: &toml::Table) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Write(format!("{}: {}", parent.display(), e)))?;
        }

        let content =
            toml::to_string_pretty(table).map_err(|e| StoreError::Write(e.to_string()))?;

        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)
            .map_err(|e| StoreError::Write(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            warn!("Failed to replace {}: {}", self.path.display(), e);
            StoreError::Write(format!("{}: {}", self.path.display(), e))
        })
    }
}

impl ConfigStore for TomlFileStore {
    fn get(&self, key: &str) -> Result<Option<toml::Value>, StoreError> {
        let table = self
            .table
            .lock()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(table.get(key).cloned())
    }

    fn set(&self, key: &str, value: toml::Value) -> Result<(), StoreError> {
        let mut table = self
            .table
            .lock()
            .map_err(|e| StoreError::Write(e.to_string()))?;

        // Only commit in memory once the file write went through.
        let mut next = table.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        *table = next;

        debug!("Persisted key {} to {}", key, self.path.display());
        Ok(())
    }
}
