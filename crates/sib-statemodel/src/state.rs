//! Destination lifecycle state
//!
//! Provides [`State`], the value every destination index entry carries.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Lifecycle state of a destination
///
/// A destination starts in whatever state its owner registers it with
/// (normally [`State::Unreconciled`] at startup, [`State::Active`] for a
/// destination created at runtime) and moves forward through the
/// transitions in [`crate::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum State {
    /// Loaded from the message store, not yet matched against configuration
    #[default]
    Unreconciled,

    /// Reconciled and usable
    Active,

    /// Reconciliation could not decide whether the destination still exists
    InDoubt,

    /// Message store data for the destination is unusable
    Corrupt,

    /// Destination will be rebuilt on the next restart
    ResetOnRestart,

    /// Deleted by configuration, waiting for cleanup
    DeletePending,

    /// Delete could not proceed yet
    DeleteDeferred,

    /// Cleanup of stored messages is in progress
    CleanupPending,

    /// Cleanup could not proceed yet
    CleanupDeferred,

    /// Cleanup finished; the owner may unregister the destination
    Deleted,
}

impl State {
    /// All states, in declaration order
    pub const ALL: [State; 10] = [
        State::Unreconciled,
        State::Active,
        State::InDoubt,
        State::Corrupt,
        State::ResetOnRestart,
        State::DeletePending,
        State::DeleteDeferred,
        State::CleanupPending,
        State::CleanupDeferred,
        State::Deleted,
    ];

    /// Whether the destination may be found by name
    #[inline]
    #[must_use]
    pub fn is_visible(self) -> bool {
        matches!(self, State::Active | State::InDoubt)
    }

    /// Inverse of [`State::is_visible`]
    #[inline]
    #[must_use]
    pub fn is_invisible(self) -> bool {
        !self.is_visible()
    }

    /// State is [`State::Unreconciled`]
    #[inline]
    #[must_use]
    pub fn is_unreconciled(self) -> bool {
        self == State::Unreconciled
    }

    /// State is [`State::Active`]
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        self == State::Active
    }

    /// State is [`State::InDoubt`]
    #[inline]
    #[must_use]
    pub fn is_in_doubt(self) -> bool {
        self == State::InDoubt
    }

    /// State is [`State::Corrupt`]
    #[inline]
    #[must_use]
    pub fn is_corrupt(self) -> bool {
        self == State::Corrupt
    }

    /// State is [`State::ResetOnRestart`]
    #[inline]
    #[must_use]
    pub fn is_reset_on_restart(self) -> bool {
        self == State::ResetOnRestart
    }

    /// State is [`State::DeletePending`]
    #[inline]
    #[must_use]
    pub fn is_delete_pending(self) -> bool {
        self == State::DeletePending
    }

    /// State is [`State::DeleteDeferred`]
    #[inline]
    #[must_use]
    pub fn is_delete_deferred(self) -> bool {
        self == State::DeleteDeferred
    }

    /// State is [`State::CleanupPending`]
    #[inline]
    #[must_use]
    pub fn is_cleanup_pending(self) -> bool {
        self == State::CleanupPending
    }

    /// State is [`State::CleanupDeferred`]
    #[inline]
    #[must_use]
    pub fn is_cleanup_deferred(self) -> bool {
        self == State::CleanupDeferred
    }

    /// Terminal state
    #[inline]
    #[must_use]
    pub fn is_deleted(self) -> bool {
        self == State::Deleted
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Unreconciled => "UNRECONCILED",
            State::Active => "ACTIVE",
            State::InDoubt => "IN_DOUBT",
            State::Corrupt => "CORRUPT",
            State::ResetOnRestart => "RESET_ON_RESTART",
            State::DeletePending => "DELETE_PENDING",
            State::DeleteDeferred => "DELETE_DEFERRED",
            State::CleanupPending => "CLEANUP_PENDING",
            State::CleanupDeferred => "CLEANUP_DEFERRED",
            State::Deleted => "DELETED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unreconciled() {
        assert_eq!(State::default(), State::Unreconciled);
    }

    #[test]
    fn only_active_and_in_doubt_are_visible() {
        let visible: Vec<State> = State::ALL.into_iter().filter(|s| s.is_visible()).collect();
        assert_eq!(visible, vec![State::Active, State::InDoubt]);
    }

    #[test]
    fn visible_and_invisible_are_exclusive() {
        for state in State::ALL {
            assert_ne!(state.is_visible(), state.is_invisible(), "{state}");
        }
    }

    #[test]
    fn exactly_one_lifecycle_predicate_holds() {
        for state in State::ALL {
            let hits = [
                state.is_unreconciled(),
                state.is_active(),
                state.is_in_doubt(),
                state.is_corrupt(),
                state.is_reset_on_restart(),
                state.is_delete_pending(),
                state.is_delete_deferred(),
                state.is_cleanup_pending(),
                state.is_cleanup_deferred(),
                state.is_deleted(),
            ]
            .into_iter()
            .filter(|hit| *hit)
            .count();
            assert_eq!(hits, 1, "{state}");
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(State::DeleteDeferred.to_string(), "DELETE_DEFERRED");
        assert_eq!(State::ResetOnRestart.to_string(), "RESET_ON_RESTART");
    }
}
