//! Destinations looked up by UUID or by (bus, name)

use crate::config::IndexConfig;
use crate::destination::{DestinationRegistry, NameIndex, Slot};
use crate::error::IndexError;
use crate::filter::TypeFilter;
use crate::handler::DestinationHandler;
use crate::index::Entry;
use crate::types::{EntryKind, EntryType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Destination registry with a bus scoped name map
///
/// `put` always fills the (bus, name) slot. A `create` whose resulting state
/// is not visible clears the slot again, so the destination stays reachable
/// by UUID only until a later `create` makes it visible.
pub type DestinationIndex<H> = DestinationRegistry<H, BusNames<H>>;

/// `bus -> name -> slot`
pub struct BusNames<H: ?Sized> {
    local_bus: String,
    buses: HashMap<String, HashMap<String, Slot<H>>>,
}

impl<H: DestinationHandler + ?Sized> BusNames<H> {
    fn new(local_bus: &str) -> Self {
        let mut buses = HashMap::new();
        buses.insert(local_bus.to_string(), HashMap::new());
        Self {
            local_bus: local_bus.to_string(),
            buses,
        }
    }

    fn insert(&mut self, entry: &Entry<H, EntryType>) {
        let handler = entry.data();
        let (bus, name) = (handler.bus(), handler.name());
        let names = self.buses.entry(bus.to_string()).or_default();

        if let Some(previous) = names.insert(name.to_string(), Slot::of(entry)) {
            if !previous.holds(handler) {
                warn!(
                    bus,
                    name,
                    previous = %previous.key(),
                    uuid = %entry.key(),
                    "duplicate destination name, newer registration replaces older"
                );
            }
        }
    }

    fn slot(&self, bus: &str, name: &str) -> Option<&Slot<H>> {
        self.buses.get(bus)?.get(name)
    }
}

impl<H: DestinationHandler + ?Sized> NameIndex<H> for BusNames<H> {
    const COMPONENT: &'static str = "DestinationIndex";
    const EXPECTED_KIND: &'static str = "destination";

    fn accepts(kind: &EntryKind) -> bool {
        matches!(kind, EntryKind::Destination(_))
    }

    fn on_put(&mut self, entry: &Entry<H, EntryType>) {
        self.insert(entry);
    }

    fn on_remove(&mut self, entry: &Entry<H, EntryType>) {
        let handler: &H = entry.data();
        let (bus, name) = (handler.bus(), handler.name());
        let Some(names) = self.buses.get_mut(bus) else {
            return;
        };
        match names.get(name) {
            Some(slot) if slot.holds(handler) => {
                names.remove(name);
            }
            Some(slot) => debug!(
                bus,
                name,
                holder = %slot.key(),
                "name slot held by newer registration, left in place"
            ),
            None => {}
        }
    }

    fn on_create(&mut self, entry: &Entry<H, EntryType>) {
        if entry.entry_type().state.is_visible() {
            self.insert(entry);
        } else {
            let handler: &H = entry.data();
            trace!(
                bus = handler.bus(),
                name = handler.name(),
                state = %entry.entry_type().state,
                "created invisible, hidden from name lookup"
            );
            self.on_remove(entry);
        }
    }

    fn slots(&self) -> Vec<(String, &Slot<H>)> {
        self.buses
            .iter()
            .flat_map(|(bus, names)| {
                names
                    .iter()
                    .map(move |(name, slot)| (format!("bus {bus} name {name}"), slot))
            })
            .collect()
    }
}

impl<H: DestinationHandler + ?Sized> DestinationRegistry<H, BusNames<H>> {
    /// Create empty index for the configured local bus
    ///
    /// The config is taken as is. Use [`try_new`](Self::try_new) for a config
    /// that was not loaded through [`IndexConfig::from_toml_str`].
    #[must_use]
    pub fn new(config: &IndexConfig) -> Self {
        Self::with_names(BusNames::new(&config.local_bus), config.initial_capacity)
    }

    /// Validate `config`, then create the index
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] if the local bus name is blank.
    pub fn try_new(config: &IndexConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Destination registered as `name` on `bus` whose type passes `filter`
    #[must_use]
    pub fn find_by_name(
        &self,
        name: &str,
        bus: &str,
        filter: Option<&dyn TypeFilter<EntryType>>,
    ) -> Option<Arc<H>> {
        let guard = self.lock();
        let found = guard
            .names
            .slot(bus, name)
            .and_then(|slot| guard.lookup(slot, filter));
        trace!(bus, name, found = found.is_some(), "find_by_name");
        found
    }

    /// A (bus, name) slot is filled, whatever the state of its destination
    #[must_use]
    pub fn contains_name(&self, bus: &str, name: &str) -> bool {
        self.lock().names.slot(bus, name).is_some()
    }

    /// Buses that have a name map
    #[must_use]
    pub fn buses(&self) -> Vec<String> {
        let mut buses: Vec<String> = self.lock().names.buses.keys().cloned().collect();
        buses.sort();
        buses
    }

    /// Bus of the local messaging engine
    #[must_use]
    pub fn local_bus(&self) -> String {
        self.lock().names.local_bus.clone()
    }
}

impl<H: DestinationHandler + ?Sized> Default for DestinationRegistry<H, BusNames<H>> {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}
