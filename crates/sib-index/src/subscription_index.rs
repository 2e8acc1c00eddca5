//! Subscriptions with durable / non-durable counters

use crate::error::IndexError;
use crate::filter::{accepts, TypeFilter};
use crate::handler::SubscriptionHandler;
use crate::index::{Entry, Table};
use crate::types::SubscriptionType;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Counter values read under one lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionCounts {
    /// Durable subscriptions
    pub durable: usize,
    /// Non-durable subscriptions
    pub non_durable: usize,
}

impl SubscriptionCounts {
    /// Sum of both counters
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.durable + self.non_durable
    }

    fn add(&mut self, ty: SubscriptionType) {
        if ty.durable {
            self.durable += 1;
        } else {
            self.non_durable += 1;
        }
    }

    fn sub(&mut self, ty: SubscriptionType) {
        let counter = if ty.durable {
            &mut self.durable
        } else {
            &mut self.non_durable
        };
        *counter = counter.saturating_sub(1);
    }
}

struct Subscriptions<H: ?Sized> {
    table: Table<H, SubscriptionType>,
    counts: SubscriptionCounts,
}

/// UUID-keyed subscription registry
///
/// Durability is captured into a [`SubscriptionType`] at `put` and never
/// changes; the counters move with the map under the same lock.
pub struct SubscriptionIndex<H: ?Sized> {
    inner: Mutex<Subscriptions<H>>,
}

impl<H: SubscriptionHandler + ?Sized> SubscriptionIndex<H> {
    /// Create empty index
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create empty index with room for `capacity` subscriptions
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Subscriptions {
                table: Table::with_capacity(capacity),
                counts: SubscriptionCounts::default(),
            }),
        }
    }

    /// Register `handler` under its subscription UUID
    ///
    /// Re-registering a UUID replaces the old entry and moves the counters
    /// accordingly.
    pub fn put(&self, handler: Arc<H>) -> Entry<H, SubscriptionType> {
        let ty = SubscriptionType::of(&*handler);
        let entry = Entry::new(handler.subscription_uuid(), handler, ty);

        let mut guard = self.inner.lock();
        if let Some(previous) = guard.table.add(entry.clone()) {
            warn!(uuid = %entry.key(), "subscription re-registered, replacing");
            guard.counts.sub(previous.entry_type());
        }
        guard.counts.add(ty);

        debug!(
            uuid = %entry.key(),
            durable = ty.durable,
            local = ty.local,
            total = guard.counts.total(),
            "put subscription"
        );
        entry
    }

    /// Unregister `handler`; `None` (counters untouched) if it was not registered
    pub fn remove(&self, handler: &H) -> Option<Arc<H>> {
        let uuid = handler.subscription_uuid();
        let mut guard = self.inner.lock();
        let Some(entry) = guard.table.remove(&uuid) else {
            debug!(%uuid, "remove of unregistered subscription ignored");
            return None;
        };
        guard.counts.sub(entry.entry_type());

        debug!(%uuid, total = guard.counts.total(), "remove subscription");
        Some(Arc::clone(entry.data()))
    }

    /// Subscription under `uuid` whose type passes `filter`
    #[must_use]
    pub fn find_by_uuid(
        &self,
        uuid: &Uuid,
        filter: Option<&dyn TypeFilter<SubscriptionType>>,
    ) -> Option<Arc<H>> {
        let found = self.inner.lock().table.get(uuid, filter).cloned();
        trace!(%uuid, found = found.is_some(), "find subscription");
        found
    }

    /// Copy of the subscription's type
    #[must_use]
    pub fn get_type(&self, uuid: &Uuid) -> Option<SubscriptionType> {
        self.inner.lock().table.type_of(uuid)
    }

    /// Subscription UUID is registered
    #[must_use]
    pub fn contains_key(&self, uuid: &Uuid) -> bool {
        self.inner.lock().table.contains_key(uuid)
    }

    /// Every subscription whose type passes `filter`
    #[must_use]
    pub fn snapshot(&self, filter: Option<&dyn TypeFilter<SubscriptionType>>) -> Vec<Arc<H>> {
        self.inner.lock().table.snapshot(filter)
    }

    /// Durable subscription count
    #[must_use]
    pub fn durable_subscriptions(&self) -> usize {
        self.inner.lock().counts.durable
    }

    /// Non-durable subscription count
    #[must_use]
    pub fn non_durable_subscriptions(&self) -> usize {
        self.inner.lock().counts.non_durable
    }

    /// Sum of durable and non-durable counts
    #[must_use]
    pub fn total_subscriptions(&self) -> usize {
        self.inner.lock().counts.total()
    }

    /// Both counters, consistent with each other
    #[must_use]
    pub fn counts(&self) -> SubscriptionCounts {
        self.inner.lock().counts
    }

    /// Number of registered subscriptions
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().table.len()
    }

    /// No subscriptions registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recount the map and compare with the counters
    ///
    /// # Errors
    /// Returns [`IndexError::Integrity`] if they disagree.
    pub fn verify_integrity(&self) -> Result<(), IndexError> {
        let guard = self.inner.lock();
        let mut recount = SubscriptionCounts::default();
        for entry in guard.table.entries() {
            recount.add(entry.entry_type());
        }
        if recount != guard.counts {
            return Err(IndexError::Integrity(format!(
                "subscription counters {:?} disagree with map recount {:?}",
                guard.counts, recount
            )));
        }
        Ok(())
    }

    /// Subscriptions matching a filter, counted under the lock
    #[must_use]
    pub fn count(&self, filter: Option<&dyn TypeFilter<SubscriptionType>>) -> usize {
        self.inner
            .lock()
            .table
            .entries()
            .filter(|e| accepts(filter, &e.entry_type()))
            .count()
    }
}

impl<H: SubscriptionHandler + ?Sized> Default for SubscriptionIndex<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for SubscriptionIndex<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.lock();
        f.debug_struct("SubscriptionIndex")
            .field("len", &guard.table.len())
            .field("counts", &guard.counts)
            .finish()
    }
}
