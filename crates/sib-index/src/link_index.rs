//! Links looked up by UUID, name or MQ link UUID

use crate::config::IndexConfig;
use crate::destination::{DestinationRegistry, FlatNames, NameIndex, Slot};
use crate::filter::TypeFilter;
use crate::handler::DestinationHandler;
use crate::index::Entry;
use crate::types::{EntryKind, EntryType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};
use uuid::Uuid;

const COMPONENT: &str = "LinkIndex";

/// Registry of inter-bus and MQ links
///
/// Entries whose type has `mq_link` set are also indexed by the handler's
/// [`mq_link_uuid`](DestinationHandler::mq_link_uuid).
pub type LinkIndex<H> = DestinationRegistry<H, LinkNames<H>>;

/// Flat name map plus `mq link uuid -> slot`
pub struct LinkNames<H: ?Sized> {
    names: FlatNames<H>,
    mq_links: HashMap<Uuid, Slot<H>>,
}

impl<H: DestinationHandler + ?Sized> NameIndex<H> for LinkNames<H> {
    const COMPONENT: &'static str = COMPONENT;
    const EXPECTED_KIND: &'static str = "link";

    fn accepts(kind: &EntryKind) -> bool {
        matches!(kind, EntryKind::Link(_))
    }

    fn on_put(&mut self, entry: &Entry<H, EntryType>) {
        self.names.insert(entry);

        if entry.entry_type().is_mq_link() {
            let handler = entry.data();
            match handler.mq_link_uuid() {
                Some(mq_uuid) => {
                    self.mq_links.insert(mq_uuid, Slot::of(entry));
                }
                None => warn!(
                    name = handler.name(),
                    uuid = %entry.key(),
                    "MQ link type on a handler without an MQ link uuid"
                ),
            }
        }
    }

    fn on_remove(&mut self, entry: &Entry<H, EntryType>) {
        let handler: &H = entry.data();
        self.names.remove_if_held(handler);

        if entry.entry_type().is_mq_link() {
            if let Some(mq_uuid) = handler.mq_link_uuid() {
                if self.mq_links.get(&mq_uuid).is_some_and(|slot| slot.holds(handler)) {
                    self.mq_links.remove(&mq_uuid);
                }
            }
        }
    }

    fn slots(&self) -> Vec<(String, &Slot<H>)> {
        self.names
            .labelled()
            .chain(
                self.mq_links
                    .iter()
                    .map(|(mq_uuid, slot)| (format!("{COMPONENT} mq link {mq_uuid}"), slot)),
            )
            .collect()
    }
}

impl<H: DestinationHandler + ?Sized> DestinationRegistry<H, LinkNames<H>> {
    /// Create empty index
    #[must_use]
    pub fn new(config: &IndexConfig) -> Self {
        Self::with_names(
            LinkNames {
                names: FlatNames::new(COMPONENT),
                mq_links: HashMap::new(),
            },
            config.initial_capacity,
        )
    }

    /// Link registered as `name` whose type passes `filter`
    #[must_use]
    pub fn find_by_name(&self, name: &str, filter: Option<&dyn TypeFilter<EntryType>>) -> Option<Arc<H>> {
        let guard = self.lock();
        let found = guard.names.names.get(name).and_then(|slot| guard.lookup(slot, filter));
        trace!(name, found = found.is_some(), "find_by_name");
        found
    }

    /// MQ link registered under `mq_link_uuid` whose type passes `filter`
    #[must_use]
    pub fn find_by_mq_link_uuid(
        &self,
        mq_link_uuid: &Uuid,
        filter: Option<&dyn TypeFilter<EntryType>>,
    ) -> Option<Arc<H>> {
        let guard = self.lock();
        let found = guard
            .names
            .mq_links
            .get(mq_link_uuid)
            .and_then(|slot| guard.lookup(slot, filter));
        trace!(%mq_link_uuid, found = found.is_some(), "find_by_mq_link_uuid");
        found
    }

    /// Name slot is filled
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.lock().names.names.get(name).is_some()
    }
}

impl<H: DestinationHandler + ?Sized> Default for DestinationRegistry<H, LinkNames<H>> {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{LinkTypeFilter, StateFilter};
    use crate::test_support::Dest;
    use crate::types::LinkFlags;
    use sib_statemodel::State;

    fn mq_type() -> EntryType {
        EntryType::link(State::Active, LinkFlags::default().with_mq_link(true))
    }

    #[test]
    fn mq_link_indexed_and_cleared() {
        let index = LinkIndex::default();
        let link = Dest::mq("MQ1", "BusA");
        let mq_uuid = link.mq_link.unwrap();
        index.put(Arc::clone(&link), mq_type()).unwrap();

        let found = index.find_by_mq_link_uuid(&mq_uuid, None).unwrap();
        assert!(Arc::ptr_eq(&found, &link));
        assert!(index.find_by_name("MQ1", None).is_some());

        index.remove(&link).unwrap();
        assert!(index.find_by_mq_link_uuid(&mq_uuid, None).is_none());
        assert!(index.find_by_name("MQ1", None).is_none());
        index.verify_integrity().unwrap();
    }

    #[test]
    fn plain_link_not_in_mq_map() {
        let index = LinkIndex::default();
        let link = Dest::mq("L1", "BusA");
        let mq_uuid = link.mq_link.unwrap();
        index
            .put(Arc::clone(&link), EntryType::link(State::Active, LinkFlags::default()))
            .unwrap();

        assert!(index.find_by_mq_link_uuid(&mq_uuid, None).is_none());
        assert!(index.contains_name("L1"));
        index.remove(&link).unwrap();
        index.verify_integrity().unwrap();
    }

    #[test]
    fn re_registered_uuid_clears_mq_slot() {
        let index = LinkIndex::default();
        let link = Dest::mq("MQ1", "BusA");
        let mq_uuid = link.mq_link.unwrap();
        index.put(Arc::clone(&link), mq_type()).unwrap();

        let plain = Dest::same_uuid(&link, "L2");
        index
            .put(Arc::clone(&plain), EntryType::link(State::Active, LinkFlags::default()))
            .unwrap();
        assert!(index.find_by_mq_link_uuid(&mq_uuid, None).is_none());
        assert!(!index.contains_name("MQ1"));
        index.verify_integrity().unwrap();

        let removed = index.remove(&link).unwrap();
        assert!(Arc::ptr_eq(removed.data(), &plain));
        assert!(!index.contains_name("L2"));
        assert!(index.is_empty());
        index.verify_integrity().unwrap();
    }

    /// Carries an MQ link uuid without claiming to be an MQ link
    #[derive(Debug)]
    struct UntaggedMqLink {
        uuid: Uuid,
        mq_uuid: Uuid,
    }

    impl DestinationHandler for UntaggedMqLink {
        fn uuid(&self) -> Uuid {
            self.uuid
        }

        fn name(&self) -> &str {
            "Untagged"
        }

        fn bus(&self) -> &str {
            "BusA"
        }

        fn has_local(&self) -> bool {
            true
        }

        fn has_remote(&self) -> bool {
            false
        }

        fn mq_link_uuid(&self) -> Option<Uuid> {
            Some(self.mq_uuid)
        }
    }

    #[test]
    fn mq_slot_follows_stored_type_not_handler() {
        let index = LinkIndex::default();
        let link = Arc::new(UntaggedMqLink {
            uuid: Uuid::new_v4(),
            mq_uuid: Uuid::new_v4(),
        });
        index.put(Arc::clone(&link), mq_type()).unwrap();
        assert!(index.find_by_mq_link_uuid(&link.mq_uuid, None).is_some());

        index.remove(&link).unwrap();
        assert!(index.find_by_mq_link_uuid(&link.mq_uuid, None).is_none());
        index.verify_integrity().unwrap();
    }

    #[test]
    fn link_filter() {
        let index = LinkIndex::default();
        let link = Dest::mq("MQ1", "BusA");
        index.put(Arc::clone(&link), mq_type()).unwrap();

        let mq = LinkTypeFilter::new().mq_link(true);
        assert!(index.find_by_name("MQ1", Some(&mq)).is_some());
        let deleting = LinkTypeFilter::new().with_state(StateFilter::new().delete_pending(true));
        assert!(index.find_by_name("MQ1", Some(&deleting)).is_none());

        index.delete(&link).unwrap();
        assert!(index.find_by_name("MQ1", Some(&deleting)).is_some());
    }

    #[test]
    fn rejects_destination_type() {
        let index = LinkIndex::default();
        let err = index
            .put(
                Dest::new("Q1", "BusA"),
                EntryType::destination(State::Active, crate::types::DestinationFlags::default()),
            )
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(index.is_empty());
    }
}
