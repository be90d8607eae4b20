//! Delivery of records to subscriptions.
//!
//! No lock is held while a listener runs. Each delivery first claims its
//! subscription from the manager (removing it if one-shot), then releases
//! the lock and invokes the listener, so listeners may publish, subscribe or
//! unsubscribe on the same store.

use crate::error::{Result, StoreError};
use crate::registry::Registry;
use crate::types::{EventRecord, SubscriptionId};

pub(crate) struct Dispatcher<'a> {
    registry: &'a Registry,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Deliver `record` to every subscription of its event whose tag matches.
    ///
    /// Visits subscriptions in list order as of the start of the broadcast.
    /// Entries removed by an earlier listener are skipped. The first listener
    /// error stops the broadcast and is returned.
    pub(crate) fn broadcast_all(&self, record: &EventRecord) -> Result<usize> {
        let ids = self.registry.subscriptions.ids(&record.name);
        let mut delivered = 0;

        for id in ids {
            if self.deliver(&record.name, id, record, true)? {
                delivered += 1;
            }
        }

        tracing::trace!(
            scope = %self.registry.scope(),
            event = %record.name,
            delivered,
            "broadcast complete"
        );
        Ok(delivered)
    }

    /// Deliver one record to one subscription.
    ///
    /// Without an explicit record the stored one is used; with no stored
    /// record this is a no-op. The subscription's tag is not compared, so a
    /// late subscriber always receives the last stored value. Returns
    /// whether the listener was invoked.
    pub(crate) fn deliver_one(
        &self,
        name: &str,
        id: SubscriptionId,
        explicit: Option<&EventRecord>,
    ) -> Result<bool> {
        let stored;
        let record = match explicit {
            Some(record) => record,
            None => match self.registry.get(name)? {
                Some(record) => {
                    stored = record;
                    &stored
                }
                None => return Ok(false),
            },
        };

        self.deliver(name, id, record, false)
    }

    /// Claim the subscription, then invoke its listener with no lock held.
    fn deliver(
        &self,
        name: &str,
        id: SubscriptionId,
        record: &EventRecord,
        match_tag: bool,
    ) -> Result<bool> {
        let claimed = self.registry.subscriptions.claim(
            name,
            id,
            record.param_tag.as_ref(),
            match_tag,
        );
        let Some(subscription) = claimed else {
            return Ok(false);
        };

        tracing::trace!(
            scope = %self.registry.scope(),
            event = %name,
            id = %id,
            one_shot = subscription.one_shot,
            "deliver"
        );

        subscription
            .listener
            .invoke(&record.data, &subscription.delivery())
            .map_err(|source| StoreError::Listener {
                event: name.to_string(),
                source,
            })?;

        Ok(true)
    }
}
