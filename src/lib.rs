//! State-vector quantum circuit simulator
//!
//! This crate simulates small qubit registers exactly: a state of `n` qubits
//! is held as `2^n` complex amplitudes, gates are applied by bit-masking, and
//! measurement collapses the state. Circuits can be built in code, parsed
//! from a simple line-oriented text format, and run concurrently as batches
//! of independent experiments.

pub mod error;
pub mod config;
pub mod quantum;
pub mod simulators;

pub use config::SimulatorConfig;
pub use error::{QuantumError, Result};

// Create a prelude module for convenient imports
pub mod prelude {
    pub use crate::quantum::prelude::*;
    pub use crate::simulators::{StatevectorSimulator, BatchSimulator, ExperimentRunner, CancellationToken};
    pub use crate::{QuantumError, Result, SimulatorConfig};
}

// Version and crate information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
