//! Entry type metadata
//!
//! Every registered handler carries an [`EntryType`]: its lifecycle
//! [`State`] plus flags specific to the index it lives in. Types are `Copy`
//! values; an index replaces a stored type wholesale, so a copy handed to
//! a caller is always a snapshot.

use crate::handler::SubscriptionHandler;
use serde::{Deserialize, Serialize};
use sib_statemodel::State;

/// Flags stored by the destination index
///
/// `None` means unset; a filter treats it as "don't care" only on the
/// filter side, an unset type flag never equals `Some(_)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DestinationFlags {
    /// Point-to-point queue (as opposed to a topic space)
    pub queue: Option<bool>,
    /// Alias for another destination
    pub alias: Option<bool>,
    /// Destination on a foreign bus
    pub foreign_destination: Option<bool>,
    /// Localized on this messaging engine
    pub local: Option<bool>,
    /// Localized on other messaging engines
    pub remote: Option<bool>,
}

impl DestinationFlags {
    /// Set queue flag
    #[inline]
    #[must_use]
    pub fn with_queue(mut self, queue: bool) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Set alias flag
    #[inline]
    #[must_use]
    pub fn with_alias(mut self, alias: bool) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Set foreign destination flag
    #[inline]
    #[must_use]
    pub fn with_foreign_destination(mut self, foreign: bool) -> Self {
        self.foreign_destination = Some(foreign);
        self
    }

    /// Set local flag
    #[inline]
    #[must_use]
    pub fn with_local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    /// Set remote flag
    #[inline]
    #[must_use]
    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = Some(remote);
        self
    }
}

/// Flags stored by the link index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkFlags {
    /// Link localized on this messaging engine
    pub local: Option<bool>,
    /// Link to an MQ-family system
    pub mq_link: Option<bool>,
    /// Link localized on other messaging engines
    pub remote: Option<bool>,
}

impl LinkFlags {
    /// Set local flag
    #[inline]
    #[must_use]
    pub fn with_local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    /// Set MQ link flag
    #[inline]
    #[must_use]
    pub fn with_mq_link(mut self, mq_link: bool) -> Self {
        self.mq_link = Some(mq_link);
        self
    }

    /// Set remote flag
    #[inline]
    #[must_use]
    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = Some(remote);
        self
    }
}

/// Which index an entry type belongs to, with its specific flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Queue, topic space, alias or foreign destination
    Destination(DestinationFlags),
    /// Foreign bus (no extra flags)
    ForeignBus,
    /// Inter-bus or MQ link
    Link(LinkFlags),
}

impl EntryKind {
    /// Short name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Destination(_) => "destination",
            EntryKind::ForeignBus => "foreign bus",
            EntryKind::Link(_) => "link",
        }
    }
}

/// Metadata stored for a destination index entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryType {
    /// Lifecycle state
    pub state: State,
    /// Index specific flags
    pub kind: EntryKind,
}

impl EntryType {
    /// Destination entry
    #[inline]
    #[must_use]
    pub fn destination(state: State, flags: DestinationFlags) -> Self {
        Self {
            state,
            kind: EntryKind::Destination(flags),
        }
    }

    /// Foreign bus entry
    #[inline]
    #[must_use]
    pub fn foreign_bus(state: State) -> Self {
        Self {
            state,
            kind: EntryKind::ForeignBus,
        }
    }

    /// Link entry
    #[inline]
    #[must_use]
    pub fn link(state: State, flags: LinkFlags) -> Self {
        Self {
            state,
            kind: EntryKind::Link(flags),
        }
    }

    /// Copy with a different state
    #[inline]
    #[must_use]
    pub fn with_state(self, state: State) -> Self {
        Self { state, ..self }
    }

    /// Copy with local/remote flags set
    ///
    /// Foreign bus entries carry no localization flags and are returned unchanged.
    #[must_use]
    pub fn with_localization(self, local: bool, remote: bool) -> Self {
        let kind = match self.kind {
            EntryKind::Destination(flags) => {
                EntryKind::Destination(flags.with_local(local).with_remote(remote))
            }
            EntryKind::Link(flags) => EntryKind::Link(flags.with_local(local).with_remote(remote)),
            EntryKind::ForeignBus => EntryKind::ForeignBus,
        };
        Self { kind, ..self }
    }

    /// Link entry flagged as MQ link
    #[inline]
    #[must_use]
    pub fn is_mq_link(&self) -> bool {
        matches!(self.kind, EntryKind::Link(LinkFlags { mq_link: Some(true), .. }))
    }
}

/// Metadata stored for a subscription; fixed at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionType {
    /// Subscription made on this messaging engine
    pub local: bool,
    /// Survives consumer disconnect
    pub durable: bool,
}

impl SubscriptionType {
    /// Capture the flags of a handler
    #[must_use]
    pub fn of<H: SubscriptionHandler + ?Sized>(handler: &H) -> Self {
        Self {
            local: handler.is_local(),
            durable: handler.is_durable(),
        }
    }
}

impl Default for SubscriptionType {
    fn default() -> Self {
        Self {
            local: true,
            durable: false,
        }
    }
}
