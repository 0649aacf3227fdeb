//! Error types for the simulator

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, QuantumError>;

/// Errors that can occur while building or simulating circuits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantumError {
    #[error("Qubit index {qubit} out of range for {qubit_count}-qubit register")]
    QubitOutOfRange { qubit: usize, qubit_count: usize },

    #[error("Qubit {0} appears more than once in a single gate")]
    DuplicateQubit(usize),

    #[error("Gate {gate} acts on {expected} qubits, but {actual} were given")]
    ArityMismatch {
        gate: String,
        expected: usize,
        actual: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{requested} qubits requested, but the limit is {max}")]
    TooManyQubits { requested: usize, max: usize },

    #[error("Could not allocate a state vector of dimension {dimension}")]
    AllocationFailed { dimension: usize },

    #[error("Invalid gate matrix: {0}")]
    InvalidMatrix(String),

    #[error("Gate matrix for {0} is not unitary")]
    NotUnitary(String),

    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    #[error("Line {line}: invalid operand '{token}': {reason}")]
    InvalidOperand {
        line: usize,
        token: String,
        reason: String,
    },

    #[error("Measurement did not select a basis state (cumulative probability {0})")]
    MeasurementFailed(f64),

    #[error("Simulation cancelled")]
    Cancelled,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
