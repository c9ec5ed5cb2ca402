//! In-memory key-value backend.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::application::store::{KeyValueStore, StoreError};

/// Process-local backend; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Read {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Write {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
