//! Minimal handlers for unit tests

use crate::handler::{DestinationHandler, SubscriptionHandler};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
pub(crate) struct Dest {
    pub(crate) uuid: Uuid,
    pub(crate) name: String,
    pub(crate) bus: String,
    pub(crate) mq_link: Option<Uuid>,
}

impl Dest {
    pub(crate) fn new(name: &str, bus: &str) -> Arc<Self> {
        Arc::new(Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            bus: bus.to_string(),
            mq_link: None,
        })
    }

    pub(crate) fn mq(name: &str, bus: &str) -> Arc<Self> {
        Arc::new(Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            bus: bus.to_string(),
            mq_link: Some(Uuid::new_v4()),
        })
    }

    pub(crate) fn same_uuid(other: &Self, name: &str) -> Arc<Self> {
        Arc::new(Self {
            uuid: other.uuid,
            name: name.to_string(),
            bus: other.bus.clone(),
            mq_link: None,
        })
    }
}

impl DestinationHandler for Dest {
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
        true
    }

    fn has_remote(&self) -> bool {
        false
    }

    fn is_mq_link(&self) -> bool {
        self.mq_link.is_some()
    }

    fn mq_link_uuid(&self) -> Option<Uuid> {
        self.mq_link
    }
}

#[derive(Debug)]
pub(crate) struct Sub {
    pub(crate) uuid: Uuid,
    pub(crate) durable: bool,
}

impl Sub {
    pub(crate) fn new(durable: bool) -> Arc<Self> {
        Arc::new(Self {
            uuid: Uuid::new_v4(),
            durable,
        })
    }
}

impl SubscriptionHandler for Sub {
    fn subscription_uuid(&self) -> Uuid {
        self.uuid
    }

    fn is_durable(&self) -> bool {
        self.durable
    }
}
