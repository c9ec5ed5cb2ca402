//! Typed access to persisted settings over a string-only key-value backend.
//!
//! [`SettingStore`] is the only component that touches the backend.  Reads go
//! through the setting's codec and fall back to its default on any failure;
//! writes are encoded with the same codec and announced to subscribers as a
//! [`SettingChange`] so the reactive runtime can refresh dependent nodes.
//!
//! # Failure policy
//!
//! | Situation                        | Result of `get`        | Logged at |
//! |----------------------------------|------------------------|-----------|
//! | key absent                       | default                | n/a       |
//! | backend read error               | default                | `warn`    |
//! | stored value not decodable       | default                | `debug`   |
//!
//! Writes are last-writer-wins: there is no locking across keys and no
//! transaction spanning several keys.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{trace, warn};

use webui_settings_core::{CodecError, Setting};

/// Capacity of the change-notification channel.  A subscriber that falls
/// further behind than this receives `RecvError::Lagged` and should treat it
/// as "everything may have changed".
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Error reported by a key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be read.
    #[error("failed to read {key:?} from settings backend: {reason}")]
    Read { key: String, reason: String },

    /// The backend rejected or failed a write.
    #[error("failed to write {key:?} to settings backend: {reason}")]
    Write { key: String, reason: String },

    /// The value could not be encoded for storage.
    #[error("failed to encode value for {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },
}

/// String key-value persistence backend.
///
/// Infrastructure implementations keep values in memory or in a TOML file;
/// test implementations can inject failures.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored string for `key`, or `None` when the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Notification that the stored value for `key` was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChange {
    pub key: String,
}

/// Typed accessor layer over a [`KeyValueStore`].
pub struct SettingStore {
    backend: Arc<dyn KeyValueStore>,
    changes: broadcast::Sender<SettingChange>,
}

impl SettingStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { backend, changes }
    }

    /// Returns the current value of `setting`, or its default.
    ///
    /// Never fails: see the module-level failure policy.
    pub fn get<T: Clone>(&self, setting: &Setting<T>) -> T {
        let raw = self.get_raw(setting.key());
        setting.decode_or_default(raw.as_deref())
    }

    /// Encodes and stores `value`, then notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if the codec rejects the value, or the
    /// backend's [`StoreError::Write`].
    pub fn set<T>(&self, setting: &Setting<T>, value: &T) -> Result<(), StoreError> {
        let encoded = setting.encode(value).map_err(|source| StoreError::Encode {
            key: setting.key().to_string(),
            source,
        })?;
        self.set_raw(setting.key(), &encoded)
    }

    /// Returns the raw stored string for `key`.  Backend read errors are
    /// logged and reported as absence.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        match self.backend.read(key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "settings backend read failed, using default");
                None
            }
        }
    }

    /// Stores an already-encoded value and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError::Write`].
    pub fn set_raw(&self, key: &str, encoded: &str) -> Result<(), StoreError> {
        self.backend.write(key, encoded)?;
        trace!(key, "setting written");
        // `send` only fails when nobody is subscribed, which is fine.
        let _ = self.changes.send(SettingChange {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Subscribes to write notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.changes.subscribe()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
