//! Workload handlers

use sib_index::{DestinationHandler, SubscriptionHandler};
use uuid::Uuid;

/// Destination registered by a simulated messaging engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDestination {
    /// Primary key
    pub uuid: Uuid,
    /// Destination name
    pub name: String,
    /// Owning bus
    pub bus: String,
}

impl SimDestination {
    /// Destination with a fresh UUID
    #[must_use]
    pub fn new(name: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            bus: bus.into(),
        }
    }
}

impl DestinationHandler for SimDestination {
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
}

/// Subscription registered by a simulated consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimSubscription {
    /// Subscription key
    pub uuid: Uuid,
    /// Survives disconnect
    pub durable: bool,
}

impl SimSubscription {
    /// Subscription with a fresh UUID
    #[must_use]
    pub fn new(durable: bool) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            durable,
        }
    }
}

impl SubscriptionHandler for SimSubscription {
    fn subscription_uuid(&self) -> Uuid {
        self.uuid
    }

    fn is_durable(&self) -> bool {
        self.durable
    }
}
