//! Registries pairing a record table with its subscription lists.
//!
//! Two registries exist per store, one per [`Scope`]. They share semantics
//! and never see each other's records or listeners.

mod table;

pub use table::{DurableTable, RecordTable, TransientTable};

use crate::backend::DurableAdapter;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::params::equal_params;
use crate::subscriptions::{Listener, Registration, Subscription, SubscriptionManager};
use crate::types::{EventRecord, Scope, SubscriptionId};
use serde_json::Value;
use std::sync::Arc;

/// How a record is published.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishMode {
    /// Deliver without storing the record.
    pub temporary: bool,
    /// Store without delivering.
    pub silent: bool,
}

/// Record table plus subscriptions for one scope.
pub struct Registry {
    scope: Scope,
    table: Box<dyn RecordTable>,
    pub(crate) subscriptions: SubscriptionManager,
}

impl Registry {
    pub fn new(scope: Scope, table: Box<dyn RecordTable>) -> Self {
        Self {
            scope,
            table,
            subscriptions: SubscriptionManager::new(),
        }
    }

    pub fn transient() -> Self {
        Self::new(Scope::Transient, Box::new(TransientTable::new()))
    }

    pub fn durable(adapter: Arc<DurableAdapter>) -> Self {
        Self::new(Scope::Durable, Box::new(DurableTable::new(adapter)))
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    // --- Records ---

    /// Store and/or broadcast a record.
    pub fn publish(&self, record: EventRecord, mode: PublishMode) -> Result<()> {
        tracing::debug!(
            scope = %self.scope,
            event = %record.name,
            temporary = mode.temporary,
            silent = mode.silent,
            "publish"
        );

        if mode.temporary {
            if !mode.silent {
                Dispatcher::new(self).broadcast_all(&record)?;
            }
            return Ok(());
        }

        if mode.silent {
            return self.table.put(record);
        }

        self.table.put(record.clone())?;
        Dispatcher::new(self).broadcast_all(&record)?;
        Ok(())
    }

    /// Remove the record for `name`. Returns whether one existed.
    pub fn erase(&self, name: &str) -> Result<bool> {
        let existed = self.table.remove(name)?;
        tracing::debug!(scope = %self.scope, event = %name, existed, "erase");
        Ok(existed)
    }

    /// Whether a record exists for `name` with a tag equal to `param_tag`.
    pub fn has(&self, name: &str, param_tag: Option<&Value>) -> Result<bool> {
        Ok(self
            .table
            .get(name)?
            .is_some_and(|record| equal_params(record.param_tag.as_ref(), param_tag)))
    }

    pub fn get(&self, name: &str) -> Result<Option<EventRecord>> {
        self.table.get(name)
    }

    /// Names of all stored records.
    pub fn names(&self) -> Result<Vec<String>> {
        self.table.names()
    }

    // --- Subscriptions ---

    /// Register a subscription and deliver the stored record to it, if any.
    pub fn subscribe(&self, subscription: Subscription) -> Result<SubscriptionId> {
        let name = subscription.name.clone();
        let registration = self.subscriptions.subscribe(subscription);

        tracing::debug!(
            scope = %self.scope,
            event = %name,
            id = %registration.id(),
            replaced = matches!(registration, Registration::Replaced(_)),
            "subscribe"
        );

        Dispatcher::new(self).deliver_one(&name, registration.id(), None)?;
        Ok(registration.id())
    }

    /// Remove the subscription matching `(listener, param_tag)`.
    pub fn unsubscribe(&self, name: &str, listener: &Listener, param_tag: Option<&Value>) -> bool {
        let removed = self.subscriptions.unsubscribe(name, listener, param_tag);
        tracing::debug!(
            scope = %self.scope,
            event = %name,
            removed = removed.is_some(),
            "unsubscribe"
        );
        removed.is_some()
    }

    pub fn is_subscribed(
        &self,
        name: &str,
        listener: &Listener,
        param_tag: Option<&Value>,
    ) -> Option<usize> {
        self.subscriptions.is_subscribed(name, listener, param_tag)
    }

    pub fn subscription_count(&self, name: &str) -> usize {
        self.subscriptions.count(name)
    }

    /// Snapshot of the subscriptions under `name`, in delivery order.
    pub fn subscriptions(&self, name: &str) -> Vec<Subscription> {
        self.subscriptions.list(name)
    }
}
