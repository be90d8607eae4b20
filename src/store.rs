//! Main EventStore struct tying all components together.

use crate::backend::{DurableAdapter, DurableBackend, DEFAULT_DURABLE_KEY};
use crate::error::Result;
use crate::registry::{PublishMode, Registry};
use crate::requests::{Erase, Exists, Publish, Subscribe, Unsubscribe};
use crate::subscriptions::{Listener, Subscription};
use crate::types::{EventRecord, Notification, Scope, SubscriptionId};
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Store configuration.
#[derive(Clone, Debug)]
pub struct EventStoreConfig {
    /// Backend key holding the durable map.
    pub durable_key: String,

    /// Capacity of listeners created by [`EventStore::channel_listener`].
    pub channel_buffer_size: usize,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            durable_key: DEFAULT_DURABLE_KEY.to_string(),
            channel_buffer_size: 1000,
        }
    }
}

/// In-process event store.
///
/// Provides a unified interface for:
/// - Publishing the latest value of a named event
/// - Subscribing listeners, with immediate catch-up from the stored value
/// - Keeping transient and durable values apart
/// - Mirroring durable values through a pluggable backend
pub struct EventStore {
    /// Store configuration.
    config: EventStoreConfig,

    /// Durable backend access, shared with the durable registry.
    adapter: Arc<DurableAdapter>,

    /// In-memory registry.
    transient: Registry,

    /// Backend-mirrored registry.
    durable: Registry,
}

impl EventStore {
    /// Create a store with the default configuration and no backend.
    pub fn new() -> Self {
        Self::with_config(EventStoreConfig::default())
    }

    pub fn with_config(config: EventStoreConfig) -> Self {
        let adapter = Arc::new(DurableAdapter::new(config.durable_key.clone()));
        Self {
            config,
            transient: Registry::transient(),
            durable: Registry::durable(Arc::clone(&adapter)),
            adapter,
        }
    }

    /// Create a store already configured with `backend`.
    pub fn with_backend(backend: impl DurableBackend + 'static) -> Self {
        let store = Self::new();
        store.configure(backend);
        store
    }

    /// Install the durable backend. Calling again replaces it.
    pub fn configure(&self, backend: impl DurableBackend + 'static) {
        self.adapter.configure(Arc::new(backend));
        tracing::debug!(key = %self.adapter.key(), "durable backend configured");
    }

    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    /// Registry for `scope`.
    pub fn registry(&self, scope: Scope) -> &Registry {
        match scope {
            Scope::Transient => &self.transient,
            Scope::Durable => &self.durable,
        }
    }

    // --- Operations ---

    /// Set the latest value of an event and notify matching listeners.
    ///
    /// A listener error stops delivery to the remaining listeners and is
    /// returned here. The record is stored before any listener runs.
    pub fn publish(&self, request: Publish) -> Result<()> {
        let record = EventRecord::new(request.event_name, request.data, request.param_tag);
        let mode = PublishMode {
            temporary: request.one_shot,
            silent: request.silent,
        };
        self.registry(request.scope).publish(record, mode)
    }

    /// Remove the stored value of an event. Missing events are ignored.
    pub fn erase(&self, request: Erase) -> Result<()> {
        self.registry(request.scope).erase(&request.event_name)?;
        Ok(())
    }

    /// Register a listener.
    ///
    /// If a value with a matching tag is stored, the listener is called with
    /// it before this returns. Subscribing the same listener with an equal
    /// tag again replaces the earlier subscription and keeps its ID.
    pub fn subscribe(&self, request: Subscribe) -> Result<SubscriptionId> {
        let subscription = Subscription::new(
            request.event_name,
            request.listener,
            request.extra_args,
            request.param_tag,
            request.one_shot,
        );
        self.registry(request.scope).subscribe(subscription)
    }

    /// Remove a listener. Returns whether a subscription was removed.
    pub fn unsubscribe(&self, request: Unsubscribe) -> Result<bool> {
        Ok(self.registry(request.scope).unsubscribe(
            &request.event_name,
            &request.listener,
            request.param_tag.as_ref(),
        ))
    }

    /// Whether a value is stored for the event under an equal tag.
    pub fn exists(&self, request: Exists) -> Result<bool> {
        self.registry(request.scope)
            .has(&request.event_name, request.param_tag.as_ref())
    }

    // --- Inspection ---

    /// Stored record for `name`, regardless of its tag.
    pub fn get(&self, name: &str, scope: Scope) -> Result<Option<EventRecord>> {
        self.registry(scope).get(name)
    }

    /// Names of all stored events in `scope`.
    pub fn event_names(&self, scope: Scope) -> Result<Vec<String>> {
        self.registry(scope).names()
    }

    pub fn subscription_count(&self, name: &str, scope: Scope) -> usize {
        self.registry(scope).subscription_count(name)
    }

    /// Listener backed by a channel sized from the store configuration.
    pub fn channel_listener(&self) -> (Listener, Receiver<Notification>) {
        Listener::channel(self.config.channel_buffer_size)
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
