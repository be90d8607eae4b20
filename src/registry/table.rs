//! Record tables backing the two registries.

use crate::backend::DurableAdapter;
use crate::error::Result;
use crate::types::{EventRecord, PersistedEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Storage for the latest record of each event name.
pub trait RecordTable: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<EventRecord>>;

    /// Insert or overwrite the record for `record.name`.
    fn put(&self, record: EventRecord) -> Result<()>;

    /// Remove the record for `name`. Returns whether one existed.
    fn remove(&self, name: &str) -> Result<bool>;

    /// Names of all stored records.
    fn names(&self) -> Result<Vec<String>>;
}

/// In-memory table.
#[derive(Default)]
pub struct TransientTable {
    records: RwLock<HashMap<String, EventRecord>>,
}

impl TransientTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordTable for TransientTable {
    fn get(&self, name: &str) -> Result<Option<EventRecord>> {
        Ok(self.records.read().get(name).cloned())
    }

    fn put(&self, record: EventRecord) -> Result<()> {
        self.records.write().insert(record.name.clone(), record);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.records.write().remove(name).is_some())
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.records.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Table mirrored into the durable backend.
///
/// Holds no state of its own: every read goes to the backend and every write
/// rewrites the whole durable map.
pub struct DurableTable {
    adapter: Arc<DurableAdapter>,
}

impl DurableTable {
    pub fn new(adapter: Arc<DurableAdapter>) -> Self {
        Self { adapter }
    }
}

impl RecordTable for DurableTable {
    fn get(&self, name: &str) -> Result<Option<EventRecord>> {
        let mut map = self.adapter.load_durable_map()?;
        Ok(map.remove(name).map(|entry| entry.into_record(name)))
    }

    fn put(&self, record: EventRecord) -> Result<()> {
        self.adapter.update(|map| {
            map.insert(record.name.clone(), PersistedEvent::from(record));
        })
    }

    fn remove(&self, name: &str) -> Result<bool> {
        self.adapter.update(|map| map.remove(name).is_some())
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.adapter.load_durable_map()?.into_keys().collect())
    }
}
