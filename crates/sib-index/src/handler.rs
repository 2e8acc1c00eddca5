//! Handler contracts
//!
//! The indexes never construct or own handlers. They hold `Arc` references
//! supplied by the messaging engine and read only the identity fields below.

use std::fmt::Debug;
use uuid::Uuid;

/// A messaging engine's in-memory view of a destination, foreign bus or link
pub trait DestinationHandler: Send + Sync + Debug {
    /// Primary key in every destination index
    fn uuid(&self) -> Uuid;

    /// Destination name, unique within its bus
    fn name(&self) -> &str;

    /// Owning bus
    fn bus(&self) -> &str;

    /// Has a localization on this messaging engine
    fn has_local(&self) -> bool;

    /// Has localizations on other messaging engines
    fn has_remote(&self) -> bool;

    /// Link to an MQ-family messaging system
    fn is_mq_link(&self) -> bool {
        false
    }

    /// UUID of the MQ link, for handlers where [`DestinationHandler::is_mq_link`] holds
    fn mq_link_uuid(&self) -> Option<Uuid> {
        None
    }
}

/// A subscription registered on a topic space
pub trait SubscriptionHandler: Send + Sync + Debug {
    /// Primary key in the subscription index
    fn subscription_uuid(&self) -> Uuid;

    /// Survives consumer disconnect
    fn is_durable(&self) -> bool;

    /// Subscription made on this messaging engine
    fn is_local(&self) -> bool {
        true
    }
}
