//! SIB State Model
//!
//! Lifecycle states for messaging destinations.
//!
//! # Overview
//!
//! - **State**: immutable lifecycle value with visibility predicates
//! - **Transition**: the operations a messaging engine drives a destination through
//! - **TransitionError**: returned for transitions the table does not allow
//!
//! Transitions never mutate a state in place; they produce the next value.
//!
//! # Example
//!
//! ```rust
//! use sib_statemodel::State;
//!
//! let state = State::Unreconciled.create().unwrap();
//! assert!(state.is_active());
//! assert!(state.is_visible());
//!
//! let state = state.delete().unwrap();
//! assert!(state.is_delete_pending());
//! assert!(state.is_invisible());
//! ```

#![warn(missing_docs)]

pub mod state;
pub mod transition;

// Re-exports
pub use state::State;
pub use transition::{allowed_transitions, Transition, TransitionError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
