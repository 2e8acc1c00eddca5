//! Testing utilities for SIB workspace
//!
//! Shared handlers, fixtures, and index setup.

#![allow(missing_docs)]

use sib_index::{
    DestinationFlags, DestinationHandler, DestinationIndex, EntryType, IndexConfig, LinkFlags,
    SubscriptionHandler, DEFAULT_LOCAL_BUS,
};
use sib_statemodel::State;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDestination {
    pub uuid: Uuid,
    pub name: String,
    pub bus: String,
    pub local: bool,
    pub remote: bool,
    pub mq_link_uuid: Option<Uuid>,
}

impl TestDestination {
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            bus: DEFAULT_LOCAL_BUS.to_string(),
            local: true,
            remote: false,
            mq_link_uuid: None,
        }
    }

    pub fn on_bus(mut self, bus: &str) -> Self {
        self.bus = bus.to_string();
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn localized(mut self, local: bool, remote: bool) -> Self {
        self.local = local;
        self.remote = remote;
        self
    }

    pub fn mq_link(mut self) -> Self {
        self.mq_link_uuid = Some(Uuid::new_v4());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl DestinationHandler for TestDestination {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bus(&self) -> &str {
        &self.bus
    }

    fn has_local(&self) -> bool {
        self.local
    }

    fn has_remote(&self) -> bool {
        self.remote
    }

    fn is_mq_link(&self) -> bool {
        self.mq_link_uuid.is_some()
    }

    fn mq_link_uuid(&self) -> Option<Uuid> {
        self.mq_link_uuid
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSubscription {
    pub uuid: Uuid,
    pub durable: bool,
    pub local: bool,
}

impl TestSubscription {
    pub fn durable() -> Arc<Self> {
        Arc::new(Self {
            uuid: Uuid::new_v4(),
            durable: true,
            local: true,
        })
    }

    pub fn non_durable() -> Arc<Self> {
        Arc::new(Self {
            uuid: Uuid::new_v4(),
            durable: false,
            local: true,
        })
    }

    pub fn remote(mut self: Arc<Self>) -> Arc<Self> {
        Arc::make_mut(&mut self).local = false;
        self
    }
}

impl SubscriptionHandler for TestSubscription {
    fn subscription_uuid(&self) -> Uuid {
        self.uuid
    }

    fn is_durable(&self) -> bool {
        self.durable
    }

    fn is_local(&self) -> bool {
        self.local
    }
}

pub fn queue_type(state: State) -> EntryType {
    EntryType::destination(state, DestinationFlags::default().with_queue(true))
}

pub fn mq_link_type(state: State) -> EntryType {
    EntryType::link(state, LinkFlags::default().with_mq_link(true))
}

pub fn setup_destination_index() -> DestinationIndex<TestDestination> {
    DestinationIndex::new(&IndexConfig::new())
}

/// Index holding `count` active queues named `Q0..` on the local bus
pub fn populated_destination_index(
    count: usize,
) -> (DestinationIndex<TestDestination>, Vec<Arc<TestDestination>>) {
    let index = setup_destination_index();
    let queues: Vec<_> = (0..count)
        .map(|i| TestDestination::new(&format!("Q{i}")).shared())
        .collect();
    for queue in &queues {
        index.put(Arc::clone(queue), queue_type(State::Active)).unwrap();
    }
    (index, queues)
}
