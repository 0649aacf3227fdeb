//! Quantum circuit simulators
//!
//! This module provides a single-state simulator and fork-join drivers that
//! spread gate batches or whole experiments across worker threads.

pub mod statevector;
pub mod parallel;

pub use statevector::StatevectorSimulator;
pub use parallel::{
    BatchPlan,
    BatchSimulator,
    CancellationToken,
    ExperimentResult,
    ExperimentRunner,
    outcome_counts,
};
