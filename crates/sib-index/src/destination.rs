//! Destination registry shared by the destination, foreign bus and link indexes
//!
//! [`DestinationRegistry`] keys handlers by UUID and drives their
//! [`State`] through the state model. Each concrete index plugs in a
//! [`NameIndex`]: a secondary lookup structure that the registry keeps in
//! step with the primary map under the same lock.
//!
//! # Locking
//!
//! One `parking_lot::Mutex` guards the primary map, the pseudo-UUID aliases
//! and the secondary structure together. No method calls out of the crate
//! while holding it, and no method takes another index's lock.

use crate::error::IndexError;
use crate::filter::{accepts, TypeFilter};
use crate::handler::DestinationHandler;
use crate::index::{Entry, Table};
use crate::types::{EntryKind, EntryType};
use parking_lot::{Mutex, MutexGuard};
use sib_statemodel::{State, Transition};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

/// `slot` and `handler` are the same object
#[inline]
pub(crate) fn same_handler<H: ?Sized>(slot: &Arc<H>, handler: &H) -> bool {
    std::ptr::eq(Arc::as_ptr(slot).cast::<()>(), (handler as *const H).cast::<()>())
}

/// Secondary map value: the primary key plus the handler registered under it
pub struct Slot<H: ?Sized> {
    key: Uuid,
    data: Arc<H>,
}

impl<H: ?Sized> Slot<H> {
    pub(crate) fn of(entry: &Entry<H, EntryType>) -> Self {
        Self {
            key: entry.key(),
            data: Arc::clone(entry.data()),
        }
    }

    /// Primary key the slot points at
    #[inline]
    #[must_use]
    pub fn key(&self) -> Uuid {
        self.key
    }

    /// Slot was filled by this handler
    #[inline]
    #[must_use]
    pub fn holds(&self, handler: &H) -> bool {
        same_handler(&self.data, handler)
    }
}

/// Secondary lookup structure of a concrete destination index
pub trait NameIndex<H: DestinationHandler + ?Sized>: Send {
    /// Index name used in diagnostics
    const COMPONENT: &'static str;

    /// Entry kind the index stores
    const EXPECTED_KIND: &'static str;

    /// Whether entries of `kind` belong in this index
    fn accepts(kind: &EntryKind) -> bool;

    /// Entry was added to the primary map
    fn on_put(&mut self, entry: &Entry<H, EntryType>);

    /// Entry left the primary map, by `remove` or by being replaced
    ///
    /// Implementations clear only slots still held by the entry's handler
    /// and decide from the entry's stored type, not from the handler.
    fn on_remove(&mut self, entry: &Entry<H, EntryType>);

    /// Create transition was applied; `entry` carries the new state
    fn on_create(&mut self, _entry: &Entry<H, EntryType>) {}

    /// Every slot with a label naming where it lives
    fn slots(&self) -> Vec<(String, &Slot<H>)>;
}

/// Single-key name map used by the flat (not bus scoped) indexes
pub struct FlatNames<H: ?Sized> {
    component: &'static str,
    slots: HashMap<String, Slot<H>>,
}

impl<H: DestinationHandler + ?Sized> FlatNames<H> {
    pub(crate) fn new(component: &'static str) -> Self {
        Self {
            component,
            slots: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, entry: &Entry<H, EntryType>) {
        let handler = entry.data();
        let name = handler.name();
        if let Some(previous) = self.slots.insert(name.to_string(), Slot::of(entry)) {
            if !Arc::ptr_eq(&previous.data, handler) {
                warn!(
                    index = self.component,
                    name,
                    previous = %previous.key,
                    uuid = %entry.key(),
                    "duplicate name, newer registration replaces older"
                );
            }
        }
    }

    pub(crate) fn remove_if_held(&mut self, handler: &H) {
        let name = handler.name();
        match self.slots.get(name) {
            Some(slot) if slot.holds(handler) => {
                self.slots.remove(name);
            }
            Some(slot) => debug!(
                index = self.component,
                name,
                holder = %slot.key,
                "name slot held by newer registration, left in place"
            ),
            None => {}
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Slot<H>> {
        self.slots.get(name)
    }

    pub(crate) fn labelled(&self) -> impl Iterator<Item = (String, &Slot<H>)> {
        self.slots
            .iter()
            .map(move |(name, slot)| (format!("{} name {name}", self.component), slot))
    }
}

/// Everything guarded by the registry lock
pub(crate) struct Registry<H: ?Sized, S> {
    pub(crate) table: Table<H, EntryType>,
    pub(crate) aliases: HashMap<Uuid, Uuid>,
    pub(crate) names: S,
}

impl<H: ?Sized, S> Registry<H, S> {
    /// Primary key for `uuid`, following a pseudo-UUID alias if needed
    fn resolve(&self, uuid: &Uuid) -> Option<Uuid> {
        if self.table.contains_key(uuid) {
            Some(*uuid)
        } else {
            self.aliases.get(uuid).copied()
        }
    }

    /// Handler behind a secondary slot, if still current and accepted
    pub(crate) fn lookup(
        &self,
        slot: &Slot<H>,
        filter: Option<&dyn TypeFilter<EntryType>>,
    ) -> Option<Arc<H>> {
        let entry = self.table.entry(&slot.key)?;
        (Arc::ptr_eq(entry.data(), &slot.data) && accepts(filter, &entry.entry_type()))
            .then(|| Arc::clone(entry.data()))
    }
}

/// UUID-keyed registry of destination handlers with lifecycle state
///
/// Concrete indexes are instantiations of this type:
/// [`DestinationIndex`](crate::DestinationIndex),
/// [`ForeignBusIndex`](crate::ForeignBusIndex) and
/// [`LinkIndex`](crate::LinkIndex).
pub struct DestinationRegistry<H: ?Sized, S> {
    inner: Mutex<Registry<H, S>>,
}

impl<H, S> DestinationRegistry<H, S>
where
    H: DestinationHandler + ?Sized,
    S: NameIndex<H>,
{
    pub(crate) fn with_names(names: S, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Registry {
                table: Table::with_capacity(capacity),
                aliases: HashMap::new(),
                names,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Registry<H, S>> {
        self.inner.lock()
    }

    /// Register `handler` under its UUID with type `ty`
    ///
    /// An existing entry under the same UUID is replaced.
    ///
    /// # Errors
    /// Returns [`IndexError::KindMismatch`] if `ty` belongs to another index.
    pub fn put(&self, handler: Arc<H>, ty: EntryType) -> Result<Entry<H, EntryType>, IndexError> {
        if !S::accepts(&ty.kind) {
            return Err(IndexError::KindMismatch {
                expected: S::EXPECTED_KIND,
                found: ty.kind.name(),
            });
        }

        let entry = Entry::new(handler.uuid(), handler, ty);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let Some(previous) = inner.table.add(entry.clone()) {
            if !Arc::ptr_eq(previous.data(), entry.data()) {
                warn!(
                    index = S::COMPONENT,
                    uuid = %entry.key(),
                    previous = previous.data().name(),
                    "uuid re-registered by a different handler"
                );
            }
            inner.names.on_remove(&previous);
        }
        inner.names.on_put(&entry);

        debug!(
            index = S::COMPONENT,
            uuid = %entry.key(),
            name = entry.data().name(),
            bus = entry.data().bus(),
            state = %ty.state,
            "put"
        );
        Ok(entry)
    }

    /// Unregister the entry under `handler`'s UUID, returning it
    ///
    /// The entry removed is whatever the primary map holds for the UUID,
    /// which may be a newer handler than `handler`. Its secondary slots and
    /// the pseudo-UUIDs pointing at it are dropped.
    ///
    /// # Errors
    /// Returns the fatal [`IndexError::DestinationNotFound`] if nothing is
    /// registered under the handler's UUID.
    pub fn remove(&self, handler: &H) -> Result<Entry<H, EntryType>, IndexError> {
        let uuid = handler.uuid();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(entry) = inner.table.remove(&uuid) else {
            let err = IndexError::DestinationNotFound {
                component: S::COMPONENT,
                marker: "remove",
                name: handler.name().to_string(),
                uuid,
            };
            error!(index = S::COMPONENT, %err, "remove of unregistered destination");
            return Err(err);
        };

        if !same_handler(entry.data(), handler) {
            debug!(
                index = S::COMPONENT,
                %uuid,
                registered = entry.data().name(),
                "remove by stale handler drops the registration now under its uuid"
            );
        }
        inner.names.on_remove(&entry);
        inner.aliases.retain(|_, target| *target != uuid);

        debug!(index = S::COMPONENT, %uuid, name = handler.name(), "remove");
        Ok(entry)
    }

    /// Handler registered under `uuid` (or a pseudo-UUID) whose type passes `filter`
    #[must_use]
    pub fn find_by_uuid(
        &self,
        uuid: &Uuid,
        filter: Option<&dyn TypeFilter<EntryType>>,
    ) -> Option<Arc<H>> {
        let guard = self.inner.lock();
        let found = guard
            .resolve(uuid)
            .and_then(|key| guard.table.get(&key, filter).cloned());
        trace!(index = S::COMPONENT, %uuid, found = found.is_some(), "find_by_uuid");
        found
    }

    /// Handler's UUID is a primary key
    #[must_use]
    pub fn contains_destination(&self, handler: &H) -> bool {
        self.inner.lock().table.contains_key(&handler.uuid())
    }

    /// `uuid` is a primary key; pseudo-UUIDs are not considered
    #[must_use]
    pub fn contains_key(&self, uuid: &Uuid) -> bool {
        self.inner.lock().table.contains_key(uuid)
    }

    /// Copy of the handler's type
    #[must_use]
    pub fn get_type(&self, handler: &H) -> Option<EntryType> {
        self.inner.lock().table.type_of(&handler.uuid())
    }

    /// Handler's current state
    #[must_use]
    pub fn get_state(&self, handler: &H) -> Option<State> {
        self.get_type(handler).map(|ty| ty.state)
    }

    /// Apply `transition` to the handler's state
    ///
    /// # Errors
    /// Returns [`IndexError::NotRegistered`] for an unknown handler and
    /// [`IndexError::Transition`] if the state model rejects the
    /// transition; the stored state is unchanged in both cases.
    pub fn transition(&self, handler: &H, transition: Transition) -> Result<(), IndexError> {
        let uuid = handler.uuid();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let current = inner
            .table
            .type_of(&uuid)
            .ok_or(IndexError::NotRegistered { uuid })?;
        let next = current.state.apply(transition)?;
        inner.table.set_type(&uuid, current.with_state(next));

        if transition == Transition::Create {
            if let Some(entry) = inner.table.entry(&uuid) {
                inner.names.on_create(entry);
            }
        }

        debug!(
            index = S::COMPONENT,
            %uuid,
            name = handler.name(),
            %transition,
            from = %current.state,
            to = %next,
            "transition"
        );
        Ok(())
    }

    /// Apply [`Transition::Create`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn create(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::Create)
    }

    /// Apply [`Transition::Delete`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn delete(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::Delete)
    }

    /// Apply [`Transition::Defer`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn defer(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::Defer)
    }

    /// Apply [`Transition::Cleanup`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn cleanup(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::Cleanup)
    }

    /// Apply [`Transition::CleanupComplete`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn cleanup_complete(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::CleanupComplete)
    }

    /// Apply [`Transition::Corrupt`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn corrupt(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::Corrupt)
    }

    /// Apply [`Transition::Reset`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn reset(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::Reset)
    }

    /// Apply [`Transition::PutUnreconciled`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn put_unreconciled(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::PutUnreconciled)
    }

    /// Apply [`Transition::PutInDoubt`]
    ///
    /// # Errors
    /// See [`DestinationRegistry::transition`].
    pub fn put_in_doubt(&self, handler: &H) -> Result<(), IndexError> {
        self.transition(handler, Transition::PutInDoubt)
    }

    /// Set local/remote flags on the handler's type
    ///
    /// # Errors
    /// Returns [`IndexError::NotRegistered`] for an unknown handler.
    pub fn set_localization_flags(
        &self,
        handler: &H,
        local: bool,
        remote: bool,
    ) -> Result<(), IndexError> {
        let uuid = handler.uuid();
        let mut guard = self.inner.lock();
        let current = guard
            .table
            .type_of(&uuid)
            .ok_or(IndexError::NotRegistered { uuid })?;
        guard
            .table
            .set_type(&uuid, current.with_localization(local, remote));

        debug!(index = S::COMPONENT, %uuid, local, remote, "localization flags");
        Ok(())
    }

    /// Copy the handler's own localization into its type
    ///
    /// # Errors
    /// See [`DestinationRegistry::set_localization_flags`].
    pub fn refresh_localization(&self, handler: &H) -> Result<(), IndexError> {
        self.set_localization_flags(handler, handler.has_local(), handler.has_remote())
    }

    /// Make the handler reachable under `pseudo_uuid` as well
    ///
    /// # Errors
    /// Returns [`IndexError::NotRegistered`] for an unknown handler.
    pub fn add_pseudo_uuid(&self, handler: &H, pseudo_uuid: Uuid) -> Result<(), IndexError> {
        let uuid = handler.uuid();
        let mut guard = self.inner.lock();
        if !guard.table.contains_key(&uuid) {
            return Err(IndexError::NotRegistered { uuid });
        }
        if guard.table.contains_key(&pseudo_uuid) {
            warn!(
                index = S::COMPONENT,
                %pseudo_uuid,
                "pseudo uuid shadows a primary key; primary wins on lookup"
            );
        }
        guard.aliases.insert(pseudo_uuid, uuid);

        debug!(index = S::COMPONENT, %uuid, %pseudo_uuid, "add pseudo uuid");
        Ok(())
    }

    /// Drop a pseudo-UUID; false if it was not registered
    ///
    /// Never touches the primary entry.
    pub fn remove_pseudo_uuid(&self, pseudo_uuid: &Uuid) -> bool {
        let removed = self.inner.lock().aliases.remove(pseudo_uuid).is_some();
        debug!(index = S::COMPONENT, %pseudo_uuid, removed, "remove pseudo uuid");
        removed
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().table.len()
    }

    /// No handlers registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every handler whose type passes `filter`, taken under one lock
    #[must_use]
    pub fn snapshot(&self, filter: Option<&dyn TypeFilter<EntryType>>) -> Vec<Arc<H>> {
        self.inner.lock().table.snapshot(filter)
    }

    /// Check secondary slots and pseudo-UUIDs against the primary map
    ///
    /// # Errors
    /// Returns [`IndexError::Integrity`] describing the first inconsistency.
    pub fn verify_integrity(&self) -> Result<(), IndexError> {
        let guard = self.inner.lock();

        for (label, slot) in guard.names.slots() {
            match guard.table.entry(&slot.key) {
                Some(entry) if Arc::ptr_eq(entry.data(), &slot.data) => {}
                Some(_) => {
                    return Err(IndexError::Integrity(format!(
                        "{label} holds a handler replaced under {}",
                        slot.key
                    )))
                }
                None => {
                    return Err(IndexError::Integrity(format!(
                        "{label} points at unregistered {}",
                        slot.key
                    )))
                }
            }
        }

        for (pseudo, target) in &guard.aliases {
            if !guard.table.contains_key(target) {
                return Err(IndexError::Integrity(format!(
                    "pseudo uuid {pseudo} points at unregistered {target}"
                )));
            }
        }

        Ok(())
    }
}

impl<H: ?Sized, S> fmt::Debug for DestinationRegistry<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.lock();
        f.debug_struct("DestinationRegistry")
            .field("len", &guard.table.len())
            .field("aliases", &guard.aliases.len())
            .finish()
    }
}
