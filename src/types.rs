//! Core types for the event store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which registry an operation targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// In-memory only, lost when the store is dropped.
    #[default]
    Transient,
    /// Mirrored into the configured durable backend.
    Durable,
}

impl Scope {
    /// Map the `persist` flag used by callers onto a scope.
    pub fn from_persist(persist: bool) -> Self {
        if persist {
            Scope::Durable
        } else {
            Scope::Transient
        }
    }

    pub fn is_durable(self) -> bool {
        matches!(self, Scope::Durable)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Transient => write!(f, "transient"),
            Scope::Durable => write!(f, "durable"),
        }
    }
}

/// Latest known value of a named event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event name (channel key).
    pub name: String,
    /// Payload delivered to listeners.
    pub data: Value,
    /// Optional tag distinguishing request shapes under one name.
    pub param_tag: Option<Value>,
}

impl EventRecord {
    pub fn new(name: impl Into<String>, data: Value, param_tag: Option<Value>) -> Self {
        Self {
            name: name.into(),
            data,
            param_tag,
        }
    }
}

/// Shape of one entry in the durable map.
///
/// The map itself is keyed by event name, so the name is not repeated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEvent {
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_tag: Option<Value>,
}

impl PersistedEvent {
    pub fn into_record(self, name: impl Into<String>) -> EventRecord {
        EventRecord::new(name, self.data, self.param_tag)
    }
}

impl From<EventRecord> for PersistedEvent {
    fn from(record: EventRecord) -> Self {
        Self {
            data: record.data,
            param_tag: record.param_tag,
        }
    }
}

/// Stable identifier of a subscription within a store.
///
/// Survives in-place replacement on dedup and is never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a listener. Clones of a [`Listener`](crate::Listener) share it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// Context passed to a listener alongside the event data.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub event_name: String,
    /// Caller-supplied value carried through from `subscribe` untouched.
    pub extra_args: Option<Value>,
}

/// Owned form of a delivery, sent over channel listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub event_name: String,
    pub data: Value,
    pub extra_args: Option<Value>,
}
