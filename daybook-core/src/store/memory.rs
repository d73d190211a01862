use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{DaybookError, DaybookResult};
use crate::store::KeyValueStore;

/// Process-local store, used for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    fn lock(&self) -> DaybookResult<std::sync::MutexGuard<'_, HashMap<String, serde_json::Value>>> {
        self.values
            .lock()
            .map_err(|_| DaybookError::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> DaybookResult<Option<serde_json::Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: serde_json::Value) -> DaybookResult<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> DaybookResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
