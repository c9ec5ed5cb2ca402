//! TOML-file key-value backend.
//!
//! Settings are kept in a flat TOML table in the platform config directory:
//! - Windows:  `%APPDATA%\WebUISettings\settings.toml`
//! - Linux:    `~/.config/webui-settings/settings.toml`
//! - macOS:    `~/Library/Application Support/WebUISettings/settings.toml`
//!
//! Each entry maps a setting key to its encoded value, exactly as the codec
//! produced it (so string values keep their JSON quotes):
//!
//! ```toml
//! language = '"english"'
//! listview = "true"
//! server-addr = '"nas.local"'
//! server-port = "3033"
//! ```
//!
//! The file is re-read on every `read`, so edits made by another process are
//! picked up.  A missing file is an empty store (first run).
//!
//! # Concurrency
//!
//! A write is a read-modify-write of the whole table.  The new table goes to
//! a sibling `.tmp` file first and is then renamed over the target, so the
//! target always holds either the old or the new table, never a truncated
//! one.  Within one process an `RwLock` serialises writers and lets readers
//! run alongside each other; across processes the last writer wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;

use crate::application::store::{KeyValueStore, StoreError};

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The table could not be serialized to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings persisted to a TOML file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    /// Opens (without creating) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, FileStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(FileStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, table: &BTreeMap<String, String>) -> Result<(), FileStoreError> {
        // Ensure directory exists before writing.
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| FileStoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(table)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, content).map_err(|source| FileStoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        // Same directory, so the rename replaces the target atomically.
        std::fs::rename(&tmp, &self.path).map_err(|source| FileStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.read().map_err(|_| StoreError::Read {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        let table = self.load().map_err(|e| StoreError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(table.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let to_store_error = |e: FileStoreError| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        };

        let _guard = self.lock.write().map_err(|_| StoreError::Write {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        let mut table = self.load().map_err(to_store_error)?;
        table.insert(key.to_string(), value.to_string());
        self.save(&table).map_err(to_store_error)?;
        debug!(key, path = %self.path.display(), "setting persisted");
        Ok(())
    }
}

/// Resolves the full path to the default settings file.
///
/// # Errors
///
/// Returns [`FileStoreError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn default_store_path() -> Result<PathBuf, FileStoreError> {
    platform_config_dir()
        .map(|dir| dir.join("settings.toml"))
        .ok_or(FileStoreError::NoPlatformConfigDir)
}

/// Resolves the platform config directory for this application.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("WebUISettings"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("webui-settings"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("WebUISettings")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
