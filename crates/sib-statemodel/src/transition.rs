//! State transitions
//!
//! Each [`Transition`] maps a [`State`] to its successor or fails with
//! [`TransitionError::Illegal`]. The table lives in [`next_state`].

use crate::state::State;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Operation applied to a destination's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Destination confirmed by configuration
    Create,
    /// Destination removed from configuration
    Delete,
    /// Postpone a pending delete or cleanup
    Defer,
    /// Start (or retry) cleanup of stored messages
    Cleanup,
    /// Cleanup finished
    CleanupComplete,
    /// Mark the stored data unusable
    Corrupt,
    /// Rebuild the destination on next restart
    Reset,
    /// Return to the pre-reconciliation state
    PutUnreconciled,
    /// Reconciliation outcome unknown
    PutInDoubt,
}

impl Transition {
    /// All transitions, in declaration order
    pub const ALL: [Transition; 9] = [
        Transition::Create,
        Transition::Delete,
        Transition::Defer,
        Transition::Cleanup,
        Transition::CleanupComplete,
        Transition::Corrupt,
        Transition::Reset,
        Transition::PutUnreconciled,
        Transition::PutInDoubt,
    ];
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Create => "create",
            Transition::Delete => "delete",
            Transition::Defer => "defer",
            Transition::Cleanup => "cleanup",
            Transition::CleanupComplete => "cleanupComplete",
            Transition::Corrupt => "corrupt",
            Transition::Reset => "reset",
            Transition::PutUnreconciled => "putUnreconciled",
            Transition::PutInDoubt => "putInDoubt",
        };
        f.write_str(name)
    }
}

/// State transition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Transition not defined for the current state
    #[error("illegal transition {transition} from state {from}")]
    Illegal {
        /// State the transition was attempted from
        from: State,
        /// Attempted transition
        transition: Transition,
    },
}

fn next_state(from: State, transition: Transition) -> Option<State> {
    use State::*;
    use Transition as T;

    match (from, transition) {
        // Live states
        (Unreconciled | Active | InDoubt, T::Create) => Some(Active),
        (Corrupt, T::Create) => Some(Corrupt),
        (ResetOnRestart, T::Create) => Some(ResetOnRestart),
        (Unreconciled | Active | InDoubt | Corrupt | ResetOnRestart, T::Delete) => {
            Some(DeletePending)
        }
        (Unreconciled | Active | InDoubt | Corrupt | ResetOnRestart, T::Corrupt) => Some(Corrupt),
        (Unreconciled | Active | InDoubt | Corrupt | ResetOnRestart, T::Reset) => {
            Some(ResetOnRestart)
        }
        (Unreconciled | Active | InDoubt | Corrupt | ResetOnRestart, T::PutUnreconciled) => {
            Some(Unreconciled)
        }
        (Unreconciled | Active | InDoubt, T::PutInDoubt) => Some(InDoubt),

        // Delete path
        (DeletePending | DeleteDeferred, T::Delete) => Some(DeletePending),
        (DeletePending | DeleteDeferred, T::Defer) => Some(DeleteDeferred),
        (DeletePending | DeleteDeferred | CleanupPending | CleanupDeferred, T::Cleanup) => {
            Some(CleanupPending)
        }
        (CleanupPending | CleanupDeferred, T::Defer) => Some(CleanupDeferred),
        (CleanupPending, T::CleanupComplete) => Some(Deleted),

        _ => None,
    }
}

/// Transitions defined for `from`
#[must_use]
pub fn allowed_transitions(from: State) -> Vec<Transition> {
    Transition::ALL
        .into_iter()
        .filter(|t| next_state(from, *t).is_some())
        .collect()
}

impl State {
    /// Apply `transition`, producing the next state
    ///
    /// # Errors
    /// Returns [`TransitionError::Illegal`] if the table has no entry for
    /// this state and transition.
    pub fn apply(self, transition: Transition) -> Result<State, TransitionError> {
        next_state(self, transition).ok_or(TransitionError::Illegal {
            from: self,
            transition,
        })
    }

    /// Apply [`Transition::Create`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn create(self) -> Result<State, TransitionError> {
        self.apply(Transition::Create)
    }

    /// Apply [`Transition::Delete`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn delete(self) -> Result<State, TransitionError> {
        self.apply(Transition::Delete)
    }

    /// Apply [`Transition::Defer`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn defer(self) -> Result<State, TransitionError> {
        self.apply(Transition::Defer)
    }

    /// Apply [`Transition::Cleanup`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn cleanup(self) -> Result<State, TransitionError> {
        self.apply(Transition::Cleanup)
    }

    /// Apply [`Transition::CleanupComplete`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn cleanup_complete(self) -> Result<State, TransitionError> {
        self.apply(Transition::CleanupComplete)
    }

    /// Apply [`Transition::Corrupt`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn corrupt(self) -> Result<State, TransitionError> {
        self.apply(Transition::Corrupt)
    }

    /// Apply [`Transition::Reset`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn reset(self) -> Result<State, TransitionError> {
        self.apply(Transition::Reset)
    }

    /// Apply [`Transition::PutUnreconciled`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn put_unreconciled(self) -> Result<State, TransitionError> {
        self.apply(Transition::PutUnreconciled)
    }

    /// Apply [`Transition::PutInDoubt`]
    ///
    /// # Errors
    /// See [`State::apply`].
    pub fn put_in_doubt(self) -> Result<State, TransitionError> {
        self.apply(Transition::PutInDoubt)
    }
}
