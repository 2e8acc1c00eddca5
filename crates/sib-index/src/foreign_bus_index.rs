//! Foreign buses looked up by UUID or name

use crate::config::IndexConfig;
use crate::destination::{DestinationRegistry, FlatNames, NameIndex, Slot};
use crate::filter::TypeFilter;
use crate::handler::DestinationHandler;
use crate::index::Entry;
use crate::types::{EntryKind, EntryType};
use std::sync::Arc;
use tracing::trace;

const COMPONENT: &str = "ForeignBusIndex";

/// Registry of foreign buses with a flat name map
pub type ForeignBusIndex<H> = DestinationRegistry<H, ForeignBusNames<H>>;

/// `name -> slot`
pub struct ForeignBusNames<H: ?Sized>(FlatNames<H>);

impl<H: DestinationHandler + ?Sized> NameIndex<H> for ForeignBusNames<H> {
    const COMPONENT: &'static str = COMPONENT;
    const EXPECTED_KIND: &'static str = "foreign bus";

    fn accepts(kind: &EntryKind) -> bool {
        matches!(kind, EntryKind::ForeignBus)
    }

    fn on_put(&mut self, entry: &Entry<H, EntryType>) {
        self.0.insert(entry);
    }

    fn on_remove(&mut self, entry: &Entry<H, EntryType>) {
        self.0.remove_if_held(entry.data());
    }

    fn slots(&self) -> Vec<(String, &Slot<H>)> {
        self.0.labelled().collect()
    }
}

impl<H: DestinationHandler + ?Sized> DestinationRegistry<H, ForeignBusNames<H>> {
    /// Create empty index
    #[must_use]
    pub fn new(config: &IndexConfig) -> Self {
        Self::with_names(ForeignBusNames(FlatNames::new(COMPONENT)), config.initial_capacity)
    }

    /// Foreign bus registered as `name` whose type passes `filter`
    #[must_use]
    pub fn find_by_name(&self, name: &str, filter: Option<&dyn TypeFilter<EntryType>>) -> Option<Arc<H>> {
        let guard = self.lock();
        let found = guard.names.0.get(name).and_then(|slot| guard.lookup(slot, filter));
        trace!(name, found = found.is_some(), "find_by_name");
        found
    }

    /// Name slot is filled
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.lock().names.0.get(name).is_some()
    }
}

impl<H: DestinationHandler + ?Sized> Default for DestinationRegistry<H, ForeignBusNames<H>> {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}
