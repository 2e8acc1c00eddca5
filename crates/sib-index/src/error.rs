//! Error types for the destination indexes
//!
//! Two classes of failure exist:
//! - recoverable: the caller asked for something the index state does not
//!   allow (unregistered handler, illegal transition, wrong entry kind)
//! - fatal: the index and its owner disagree about what is registered;
//!   [`IndexError::is_fatal`] is true and the caller should stop the
//!   operation instead of retrying

use sib_statemodel::TransitionError;
use uuid::Uuid;

/// Main index error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Handler is not registered under its UUID
    #[error("destination {uuid} is not registered")]
    NotRegistered {
        /// UUID that was looked up
        uuid: Uuid,
    },

    /// Remove of a handler the index never held
    #[error("internal error in {component} at {marker}: destination {name} ({uuid}) not found in index")]
    DestinationNotFound {
        /// Index that detected the problem
        component: &'static str,
        /// Operation that detected the problem
        marker: &'static str,
        /// Destination name
        name: String,
        /// Destination UUID
        uuid: Uuid,
    },

    /// Entry type belongs to a different index
    #[error("entry kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// Kind the index stores
        expected: &'static str,
        /// Kind that was supplied
        found: &'static str,
    },

    /// State model rejected the transition
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Secondary structure disagrees with the primary map
    #[error("index integrity violation: {0}")]
    Integrity(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl IndexError {
    /// Whether the error signals a bug in the index owner
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DestinationNotFound { .. } | Self::Integrity(_))
    }

    /// Inverse of [`IndexError::is_fatal`]
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}
