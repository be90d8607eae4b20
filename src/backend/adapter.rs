//! Adapter between the durable registry and the configured backend.

use super::{DurableBackend, NoopBackend};
use crate::error::{Result, StoreError};
use crate::types::PersistedEvent;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key under which the whole durable map is stored.
pub const DEFAULT_DURABLE_KEY: &str = "memoryStore";

/// Event name to persisted entry. This is the full durable state.
pub type DurableMap = BTreeMap<String, PersistedEvent>;

/// Reads and writes the durable map through whichever backend is configured.
pub struct DurableAdapter {
    backend: RwLock<Arc<dyn DurableBackend>>,
    key: String,
}

impl DurableAdapter {
    /// Create an adapter backed by [`NoopBackend`].
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            backend: RwLock::new(Arc::new(NoopBackend)),
            key: key.into(),
        }
    }

    /// Replace the backend. Last call wins.
    pub fn configure(&self, backend: Arc<dyn DurableBackend>) {
        *self.backend.write() = backend;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current durable map, empty when nothing has been stored yet.
    pub fn load_durable_map(&self) -> Result<DurableMap> {
        let backend = self.backend();
        match backend.get(&self.key)? {
            None | Some(Value::Null) => Ok(DurableMap::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                StoreError::Deserialization(format!("durable map '{}': {}", self.key, e))
            }),
        }
    }

    /// Overwrite the durable map in full.
    pub fn persist_durable_map(&self, map: &DurableMap) -> Result<()> {
        let value = serde_json::to_value(map)?;
        let backend = self.backend();
        backend.set(&self.key, value)
    }

    /// Read-modify-write of the whole map.
    pub fn update<F, T>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut DurableMap) -> T,
    {
        let mut map = self.load_durable_map()?;
        let out = mutate(&mut map);
        self.persist_durable_map(&map)?;
        Ok(out)
    }

    /// Clone the backend handle so no lock is held during backend I/O.
    fn backend(&self) -> Arc<dyn DurableBackend> {
        Arc::clone(&self.backend.read())
    }
}

impl Default for DurableAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_DURABLE_KEY)
    }
}
