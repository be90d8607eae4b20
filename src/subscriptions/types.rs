//! Subscription types.

use crate::error::ListenerError;
use crate::params::equal_params;
use crate::types::{Delivery, ListenerId, Notification, SubscriptionId};
use crossbeam_channel::{bounded, Receiver, TrySendError};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter for generating listener IDs.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Counter for generating subscription IDs.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

type ListenerFn =
    dyn Fn(&Value, &Delivery) -> std::result::Result<(), ListenerError> + Send + Sync;

/// Callback invoked with an event's data.
///
/// Identity is fixed when the listener is created: clones compare equal,
/// two listeners built from identical closures do not. Keep a clone around
/// to unsubscribe later.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    callback: Arc<ListenerFn>,
}

impl Listener {
    /// Listener that cannot fail.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Delivery) + Send + Sync + 'static,
    {
        Self::fallible(move |data, delivery| {
            f(data, delivery);
            Ok(())
        })
    }

    /// Listener whose error aborts the broadcast and surfaces to the caller.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&Value, &Delivery) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            id: ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed)),
            callback: Arc::new(f),
        }
    }

    /// Listener forwarding every delivery into a bounded channel.
    ///
    /// Deliveries that find the channel full or disconnected are dropped.
    pub fn channel(capacity: usize) -> (Self, Receiver<Notification>) {
        let (sender, receiver) = bounded(capacity);
        let listener = Self::new(move |data, delivery| {
            let notification = Notification {
                event_name: delivery.event_name.clone(),
                data: data.clone(),
                extra_args: delivery.extra_args.clone(),
            };
            match sender.try_send(notification) {
                Ok(()) => {}
                Err(TrySendError::Full(n)) => {
                    tracing::warn!(
                        event = %n.event_name,
                        "channel listener full, dropping notification"
                    );
                }
                Err(TrySendError::Disconnected(n)) => {
                    tracing::warn!(
                        event = %n.event_name,
                        "channel listener disconnected, dropping notification"
                    );
                }
            }
        });
        (listener, receiver)
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn invoke(
        &self,
        data: &Value,
        delivery: &Delivery,
    ) -> std::result::Result<(), ListenerError> {
        (self.callback)(data, delivery)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listener {}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Listener").field(&self.id.0).finish()
    }
}

/// A registered interest in one event name.
#[derive(Clone, Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: String,
    pub listener: Listener,
    /// Carried through to the listener untouched.
    pub extra_args: Option<Value>,
    pub param_tag: Option<Value>,
    /// Removed after its first delivery.
    pub one_shot: bool,
}

impl Subscription {
    /// Build a subscription with a fresh ID.
    pub fn new(
        name: impl Into<String>,
        listener: Listener,
        extra_args: Option<Value>,
        param_tag: Option<Value>,
        one_shot: bool,
    ) -> Self {
        Self {
            id: SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            listener,
            extra_args,
            param_tag,
            one_shot,
        }
    }

    /// Dedup identity: same listener and an equal tag.
    pub fn is_same(&self, listener: &Listener, param_tag: Option<&Value>) -> bool {
        self.listener == *listener && equal_params(self.param_tag.as_ref(), param_tag)
    }

    /// Whether a record with `param_tag` should reach this subscription.
    pub fn accepts(&self, param_tag: Option<&Value>) -> bool {
        equal_params(self.param_tag.as_ref(), param_tag)
    }

    pub(crate) fn delivery(&self) -> Delivery {
        Delivery {
            event_name: self.name.clone(),
            extra_args: self.extra_args.clone(),
        }
    }
}
