//! # Herald
//!
//! An in-process store for the latest value of named events, with
//! listeners that are notified on every write.
//!
//! ## Core Concepts
//!
//! - **Events**: A name plus its latest data and an optional parameter tag
//! - **Listeners**: Callbacks deduplicated by identity and parameter tag
//! - **Scopes**: A transient registry and a durable one mirrored to a backend
//! - **One-shot**: Publishes that are never stored, subscriptions that fire once
//!
//! ## Example
//!
//! ```ignore
//! use herald::{EventStore, Listener, MemoryBackend, Publish, Subscribe};
//! use serde_json::json;
//!
//! let store = EventStore::with_backend(MemoryBackend::new());
//!
//! // Publish a value
//! store.publish(Publish::new("user", json!({"name": "Ada"})))?;
//!
//! // Late subscribers receive the stored value immediately
//! let listener = Listener::new(|data, delivery| {
//!     println!("{} -> {}", delivery.event_name, data);
//! });
//! store.subscribe(Subscribe::new("user", listener.clone()))?;
//!
//! // Persist across restarts
//! store.publish(Publish::new("session", json!("token")).durable())?;
//! ```

pub mod backend;
mod dispatch;
pub mod error;
pub mod params;
pub mod registry;
pub mod requests;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use backend::{
    DurableAdapter, DurableBackend, DurableMap, FileBackend, FileBackendConfig, FnBackend,
    MemoryBackend, NoopBackend, DEFAULT_DURABLE_KEY,
};
pub use error::{ListenerError, Result, StoreError};
pub use params::{equal_params, equal_values};
pub use registry::{PublishMode, RecordTable, Registry};
pub use requests::{Erase, Exists, Publish, Subscribe, Unsubscribe};
pub use store::{EventStore, EventStoreConfig};
pub use subscriptions::{Listener, Registration, Subscription, SubscriptionManager};
pub use types::*;
