//! SIB Harness
//!
//! Seeded multi-threaded workloads against one index instance.
//!
//! # Overview
//!
//! - **simulator**: random put / remove / transition / lookup traffic from
//!   several rayon workers, followed by integrity and counter checks
//! - **stress**: bulk put / find / remove timing on a single thread
//! - **handler**: the destination and subscription handlers the workloads register

#![warn(missing_docs)]

pub mod handler;
pub mod simulator;
pub mod stress;

// Re-exports
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, SimulatorStats};
pub use stress::{run_stress, StressReport};
