//! Per-event subscription lists with dedup-aware insert and removal.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

use super::types::{Listener, Subscription};
use crate::types::SubscriptionId;

/// Outcome of registering a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// Appended at the end of the event's list.
    Added(SubscriptionId),
    /// Replaced an existing entry with the same identity, keeping its
    /// position and ID.
    Replaced(SubscriptionId),
}

impl Registration {
    pub fn id(self) -> SubscriptionId {
        match self {
            Registration::Added(id) | Registration::Replaced(id) => id,
        }
    }
}

/// Ordered subscription lists keyed by event name.
///
/// Locks are only held for the duration of a single list operation; nothing
/// here ever calls a listener.
pub struct SubscriptionManager {
    events: RwLock<HashMap<String, Vec<Subscription>>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a subscription, replacing an existing one with the same
    /// `(listener, param_tag)` identity in place.
    pub fn subscribe(&self, mut subscription: Subscription) -> Registration {
        let mut events = self.events.write();
        let list = events.entry(subscription.name.clone()).or_default();

        let existing = position_of(list, &subscription.listener, subscription.param_tag.as_ref());
        match existing {
            Some(index) => {
                subscription.id = list[index].id;
                list[index] = subscription;
                Registration::Replaced(list[index].id)
            }
            None => {
                let id = subscription.id;
                list.push(subscription);
                Registration::Added(id)
            }
        }
    }

    /// Remove the subscription matching `(listener, param_tag)`.
    pub fn unsubscribe(
        &self,
        name: &str,
        listener: &Listener,
        param_tag: Option<&Value>,
    ) -> Option<Subscription> {
        let mut events = self.events.write();
        let list = events.get_mut(name)?;
        let index = position_of(list, listener, param_tag)?;
        let removed = list.remove(index);
        if list.is_empty() {
            events.remove(name);
        }
        Some(removed)
    }

    /// Position of the subscription matching `(listener, param_tag)`.
    pub fn is_subscribed(
        &self,
        name: &str,
        listener: &Listener,
        param_tag: Option<&Value>,
    ) -> Option<usize> {
        let events = self.events.read();
        position_of(events.get(name)?, listener, param_tag)
    }

    /// Remove a subscription by its stable ID.
    pub fn remove_by_id(&self, name: &str, id: SubscriptionId) -> Option<Subscription> {
        let mut events = self.events.write();
        let list = events.get_mut(name)?;
        let index = list.iter().position(|s| s.id == id)?;
        let removed = list.remove(index);
        if list.is_empty() {
            events.remove(name);
        }
        Some(removed)
    }

    /// Claim a subscription for one delivery of a record tagged `param_tag`.
    ///
    /// Returns `None` if the subscription is gone, or if `match_tag` is set
    /// and the subscription does not accept the tag. A one-shot subscription
    /// is removed before being returned, so it can never be claimed twice.
    pub fn claim(
        &self,
        name: &str,
        id: SubscriptionId,
        param_tag: Option<&Value>,
        match_tag: bool,
    ) -> Option<Subscription> {
        let mut events = self.events.write();
        let list = events.get_mut(name)?;
        let index = list.iter().position(|s| s.id == id)?;
        if match_tag && !list[index].accepts(param_tag) {
            return None;
        }
        if !list[index].one_shot {
            return Some(list[index].clone());
        }

        let claimed = list.remove(index);
        if list.is_empty() {
            events.remove(name);
        }
        Some(claimed)
    }

    /// Snapshot of the IDs registered under `name`, in list order.
    pub fn ids(&self, name: &str) -> Vec<SubscriptionId> {
        self.events
            .read()
            .get(name)
            .map(|list| list.iter().map(|s| s.id).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the subscriptions registered under `name`, in list order.
    pub fn list(&self, name: &str) -> Vec<Subscription> {
        self.events.read().get(name).cloned().unwrap_or_default()
    }

    /// Number of subscriptions under `name`.
    pub fn count(&self, name: &str) -> usize {
        self.events.read().get(name).map_or(0, Vec::len)
    }

    /// Number of subscriptions across all events.
    pub fn total_count(&self) -> usize {
        self.events.read().values().map(Vec::len).sum()
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn position_of(
    list: &[Subscription],
    listener: &Listener,
    param_tag: Option<&Value>,
) -> Option<usize> {
    list.iter().position(|s| s.is_same(listener, param_tag))
}
