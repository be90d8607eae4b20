//! Durable key-value backends.
//!
//! The store only ever needs two primitives from a backend: read a value by
//! key and overwrite a value by key. Everything else (which key, what shape
//! the value has) is decided by [`DurableAdapter`].
//!
//! # Example
//!
//! ```ignore
//! let backend = MemoryBackend::new();
//! let store = EventStore::new();
//! store.configure(backend.clone());
//!
//! store.publish(Publish::new("session", json!({"user": 7})).durable())?;
//! assert!(backend.get("memoryStore")?.is_some());
//! ```

mod adapter;
mod file;

pub use adapter::{DurableAdapter, DurableMap, DEFAULT_DURABLE_KEY};
pub use file::{FileBackend, FileBackendConfig};

use crate::error::Result;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// External get/set capability used to mirror the durable registry.
pub trait DurableBackend: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

impl<B: DurableBackend + ?Sized> DurableBackend for Arc<B> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Backend installed before any configuration. Reads nothing, discards writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBackend;

impl DurableBackend for NoopBackend {
    fn get(&self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: Value) -> Result<()> {
        Ok(())
    }
}

type GetFn = dyn Fn(&str) -> Result<Option<Value>> + Send + Sync;
type SetFn = dyn Fn(&str, Value) -> Result<()> + Send + Sync;

/// Backend built from a pair of closures.
pub struct FnBackend {
    get: Box<GetFn>,
    set: Box<SetFn>,
}

impl FnBackend {
    pub fn new<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&str) -> Result<Option<Value>> + Send + Sync + 'static,
        S: Fn(&str, Value) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            get: Box::new(get),
            set: Box::new(set),
        }
    }
}

impl DurableBackend for FnBackend {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (self.get)(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (self.set)(key, value)
    }
}

impl std::fmt::Debug for FnBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnBackend").finish_non_exhaustive()
    }
}

/// In-memory backend. Clones share the same underlying map, so one handle
/// can outlive a store and be handed to the next one.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written so far.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl DurableBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}
