// src/quantum/mod.rs
//! State-vector quantum computing primitives
//!
//! This module implements amplitudes, quantum states, gates, circuits and
//! the quantum Fourier transform.

pub mod complex;
pub mod state;
pub mod gate;
pub mod registry;
pub mod hypergraph;
pub mod circuit;
pub mod fourier;

pub use state::{QuantumState, MAX_QUBITS};
pub use gate::{Gate, GateKind};
pub use registry::{GateDefinition, GateRecord, GateRegistry};
pub use hypergraph::Hypergraph;
pub use circuit::{QuantumCircuit, CircuitBuilder};

/// Re-export commonly used types and traits
pub mod prelude {
    pub use super::complex::ComplexExt;
    pub use super::{QuantumState, Gate, GateKind};
    pub use super::{QuantumCircuit, CircuitBuilder};
    pub use super::{GateRecord, GateRegistry};
}
