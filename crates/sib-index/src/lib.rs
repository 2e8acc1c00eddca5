//! SIB Destination Index
//!
//! Concurrent registries of messaging destinations and subscriptions.
//!
//! # Overview
//!
//! - **Index**: generic UUID-keyed store of [`Entry`] values with filtered reads
//! - **DestinationIndex**: destinations by UUID and by (bus, name)
//! - **ForeignBusIndex**: foreign buses by UUID and by name
//! - **LinkIndex**: links by UUID, by name and by MQ link UUID
//! - **SubscriptionIndex**: subscriptions by UUID with durable / non-durable counts
//! - **filter**: composable predicates over the stored [`EntryType`]
//!
//! Each index instance has one lock guarding its primary map and every
//! secondary map; operations never hold two index locks at once.
//!
//! # Example
//!
//! ```rust
//! use sib_index::{DestinationHandler, DestinationIndex, EntryType, DestinationFlags, StateFilter};
//! use sib_statemodel::State;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[derive(Debug)]
//! struct Queue { uuid: Uuid, name: String }
//!
//! impl DestinationHandler for Queue {
//!     fn uuid(&self) -> Uuid { self.uuid }
//!     fn name(&self) -> &str { &self.name }
//!     fn bus(&self) -> &str { "DefaultBus" }
//!     fn has_local(&self) -> bool { true }
//!     fn has_remote(&self) -> bool { false }
//! }
//!
//! let index = DestinationIndex::default();
//! let queue = Arc::new(Queue { uuid: Uuid::new_v4(), name: "Q1".into() });
//! let ty = EntryType::destination(State::Unreconciled, DestinationFlags::default().with_queue(true));
//! index.put(Arc::clone(&queue), ty).unwrap();
//! index.create(&queue).unwrap();
//!
//! let visible = StateFilter::visible_only();
//! assert!(index.find_by_name("Q1", "DefaultBus", Some(&visible)).is_some());
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod destination;
pub mod destination_index;
pub mod error;
pub mod filter;
pub mod foreign_bus_index;
pub mod handler;
pub mod index;
pub mod link_index;
pub mod subscription_index;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports
pub use config::{IndexConfig, DEFAULT_LOCAL_BUS};
pub use destination::{DestinationRegistry, NameIndex, Slot};
pub use destination_index::DestinationIndex;
pub use error::IndexError;
pub use filter::{
    DestinationTypeFilter, ForeignBusTypeFilter, LinkTypeFilter, MatchMode, StateFilter,
    SubscriptionTypeFilter, TypeFilter,
};
pub use foreign_bus_index::ForeignBusIndex;
pub use handler::{DestinationHandler, SubscriptionHandler};
pub use index::{Entry, Index};
pub use link_index::LinkIndex;
pub use subscription_index::{SubscriptionCounts, SubscriptionIndex};
pub use types::{DestinationFlags, EntryKind, EntryType, LinkFlags, SubscriptionType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
