// src/quantum/gate.rs
//! Quantum gates
//!
//! A [`Gate`] pairs a [`GateKind`] (what the gate does, plus any numeric
//! parameters) with the register indices it acts on. The transformation is a
//! pure function of the kind, so gates are plain data: they can be cloned,
//! compared, sent across threads and reduced to a [`GateRecord`] for storage.

use std::fmt;

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use super::complex::{self, constants};
use super::registry::GateRecord;
use crate::error::{QuantumError, Result};

/// 1/sqrt(2)
pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Tolerance used when checking custom matrices for unitarity
const UNITARY_TOLERANCE: f64 = 1e-9;

/// The operation performed by a gate
#[derive(Clone, Debug, PartialEq)]
pub enum GateKind {
    /// Hadamard gate
    Hadamard,

    /// Pauli-X (NOT)
    PauliX,

    /// Pauli-Y
    PauliY,

    /// Pauli-Z
    PauliZ,

    /// Controlled NOT; qubits are `[control, target]`
    Cnot,

    /// Phase rotation diag(1, e^{iθ})
    Rotation(f64),

    /// Controlled phase rotation; qubits are `[control, target]`
    ControlledRotation(f64),

    /// Exchange two qubits
    Swap,

    /// User-supplied unitary; bit `j` of the matrix index maps to `qubits[j]`
    Custom {
        name: String,
        matrix: Array2<Complex64>,
    },
}

impl GateKind {
    /// Mnemonic used by the text protocol and in gate records
    pub fn name(&self) -> &str {
        match self {
            GateKind::Hadamard => "H",
            GateKind::PauliX => "X",
            GateKind::PauliY => "Y",
            GateKind::PauliZ => "Z",
            GateKind::Cnot => "CNOT",
            GateKind::Rotation(_) => "R",
            GateKind::ControlledRotation(_) => "CR",
            GateKind::Swap => "SWAP",
            GateKind::Custom { name, .. } => name,
        }
    }

    /// Number of qubits the operation acts on
    pub fn arity(&self) -> usize {
        match self {
            GateKind::Hadamard
            | GateKind::PauliX
            | GateKind::PauliY
            | GateKind::PauliZ
            | GateKind::Rotation(_) => 1,
            GateKind::Cnot | GateKind::ControlledRotation(_) | GateKind::Swap => 2,
            GateKind::Custom { matrix, .. } => matrix.nrows().trailing_zeros() as usize,
        }
    }

    pub fn parameters(&self) -> Vec<f64> {
        match self {
            GateKind::Rotation(theta) | GateKind::ControlledRotation(theta) => vec![*theta],
            _ => Vec::new(),
        }
    }
}

/// A gate bound to specific qubits
#[derive(Clone, Debug, PartialEq)]
pub struct Gate {
    kind: GateKind,
    qubits: Vec<usize>,
}

impl Gate {
    /// Bind `kind` to `qubits`, checking the qubit count and distinctness
    pub fn new(kind: GateKind, qubits: Vec<usize>) -> Result<Self> {
        let gate = Gate { kind, qubits };
        gate.check_shape()?;
        Ok(gate)
    }

    pub fn hadamard(qubit: usize) -> Self {
        Gate { kind: GateKind::Hadamard, qubits: vec![qubit] }
    }

    pub fn pauli_x(qubit: usize) -> Self {
        Gate { kind: GateKind::PauliX, qubits: vec![qubit] }
    }

    pub fn pauli_y(qubit: usize) -> Self {
        Gate { kind: GateKind::PauliY, qubits: vec![qubit] }
    }

    pub fn pauli_z(qubit: usize) -> Self {
        Gate { kind: GateKind::PauliZ, qubits: vec![qubit] }
    }

    pub fn cnot(control: usize, target: usize) -> Self {
        Gate { kind: GateKind::Cnot, qubits: vec![control, target] }
    }

    /// Multiply the |1⟩ component of `qubit` by e^{iθ}
    pub fn rotation(qubit: usize, theta: f64) -> Self {
        Gate { kind: GateKind::Rotation(theta), qubits: vec![qubit] }
    }

    /// Multiply the |11⟩ component of `(control, target)` by e^{iθ}
    pub fn controlled_rotation(control: usize, target: usize, theta: f64) -> Self {
        Gate {
            kind: GateKind::ControlledRotation(theta),
            qubits: vec![control, target],
        }
    }

    pub fn swap(a: usize, b: usize) -> Self {
        Gate { kind: GateKind::Swap, qubits: vec![a, b] }
    }

    /// A named gate defined by a `2^k × 2^k` unitary acting on `k` qubits
    pub fn custom(name: impl Into<String>, matrix: Array2<Complex64>, qubits: Vec<usize>) -> Result<Self> {
        let name = name.into();
        let (rows, cols) = matrix.dim();

        if name.trim().is_empty() {
            return Err(QuantumError::InvalidMatrix("custom gates need a name".to_string()));
        }
        if rows != cols || !rows.is_power_of_two() || rows < 2 {
            return Err(QuantumError::InvalidMatrix(format!(
                "{} must be a square 2^k matrix, got {}x{}",
                name, rows, cols
            )));
        }
        if rows != 1 << qubits.len() {
            return Err(QuantumError::DimensionMismatch {
                expected: 1 << qubits.len(),
                actual: rows,
            });
        }
        if !complex::is_unitary(&matrix, UNITARY_TOLERANCE) {
            return Err(QuantumError::NotUnitary(name));
        }

        Gate::new(GateKind::Custom { name, matrix }, qubits)
    }

    pub fn kind(&self) -> &GateKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    pub fn qubit_count(&self) -> usize {
        self.qubits.len()
    }

    pub fn parameters(&self) -> Vec<f64> {
        self.kind.parameters()
    }

    /// Structural projection used for persistence
    pub fn record(&self) -> GateRecord {
        GateRecord {
            name: self.name().to_string(),
            qubit_count: self.qubit_count(),
            qubits: self.qubits.clone(),
            parameters: self.parameters(),
        }
    }

    /// Check that this gate can act on a register of `qubit_count` qubits
    pub fn validate(&self, qubit_count: usize) -> Result<()> {
        self.check_shape()?;

        for &qubit in &self.qubits {
            if qubit >= qubit_count {
                return Err(QuantumError::QubitOutOfRange { qubit, qubit_count });
            }
        }

        Ok(())
    }

    fn check_shape(&self) -> Result<()> {
        if self.qubits.len() != self.kind.arity() {
            return Err(QuantumError::ArityMismatch {
                gate: self.name().to_string(),
                expected: self.kind.arity(),
                actual: self.qubits.len(),
            });
        }

        for (i, qubit) in self.qubits.iter().enumerate() {
            if self.qubits[..i].contains(qubit) {
                return Err(QuantumError::DuplicateQubit(*qubit));
            }
        }

        Ok(())
    }

    /// The inverse operation on the same qubits
    pub fn adjoint(&self) -> Gate {
        let kind = match &self.kind {
            GateKind::Rotation(theta) => GateKind::Rotation(-theta),
            GateKind::ControlledRotation(theta) => GateKind::ControlledRotation(-theta),
            GateKind::Custom { name, matrix } => GateKind::Custom {
                name: format!("{}†", name),
                matrix: complex::adjoint(matrix),
            },
            self_inverse => self_inverse.clone(),
        };

        Gate { kind, qubits: self.qubits.clone() }
    }

    /// Apply the gate to a full state vector, returning the new vector
    ///
    /// The register width is taken from the length of `input`, which must be
    /// a power of two covering every qubit the gate names.
    pub fn transform(&self, input: &Array1<Complex64>) -> Result<Array1<Complex64>> {
        let dimension = input.len();
        if !dimension.is_power_of_two() {
            return Err(QuantumError::DimensionMismatch {
                expected: dimension.next_power_of_two(),
                actual: dimension,
            });
        }
        self.validate(dimension.trailing_zeros() as usize)?;

        Ok(self.transform_unchecked(input))
    }

    fn transform_unchecked(&self, input: &Array1<Complex64>) -> Array1<Complex64> {
        let mut output = input.clone();
        let dimension = input.len();

        match &self.kind {
            GateKind::Hadamard => {
                let mask = bit(self.qubits[0]);
                for i in (0..dimension).filter(|i| i & mask == 0) {
                    let j = i | mask;
                    let (a, b) = (input[i], input[j]);
                    output[i] = (a + b) * FRAC_1_SQRT_2;
                    output[j] = (a - b) * FRAC_1_SQRT_2;
                }
            }
            GateKind::PauliX => {
                let mask = bit(self.qubits[0]);
                for i in (0..dimension).filter(|i| i & mask == 0) {
                    output.swap(i, i | mask);
                }
            }
            GateKind::PauliY => {
                let mask = bit(self.qubits[0]);
                for i in (0..dimension).filter(|i| i & mask == 0) {
                    let j = i | mask;
                    output[i] = -constants::I * input[j];
                    output[j] = constants::I * input[i];
                }
            }
            GateKind::PauliZ => {
                let mask = bit(self.qubits[0]);
                for i in (0..dimension).filter(|i| i & mask != 0) {
                    output[i] = -input[i];
                }
            }
            GateKind::Cnot => {
                let control = bit(self.qubits[0]);
                let target = bit(self.qubits[1]);
                for i in (0..dimension).filter(|i| i & control != 0 && i & target == 0) {
                    output.swap(i, i | target);
                }
            }
            GateKind::Rotation(theta) => {
                let mask = bit(self.qubits[0]);
                let phase = Complex64::from_polar(1.0, *theta);
                for i in (0..dimension).filter(|i| i & mask != 0) {
                    output[i] = input[i] * phase;
                }
            }
            GateKind::ControlledRotation(theta) => {
                let mask = bit(self.qubits[0]) | bit(self.qubits[1]);
                let phase = Complex64::from_polar(1.0, *theta);
                for i in (0..dimension).filter(|i| i & mask == mask) {
                    output[i] = input[i] * phase;
                }
            }
            GateKind::Swap => {
                let a = bit(self.qubits[0]);
                let b = bit(self.qubits[1]);
                for i in (0..dimension).filter(|i| i & a != 0 && i & b == 0) {
                    output.swap(i, i ^ a ^ b);
                }
            }
            GateKind::Custom { matrix, .. } => {
                apply_matrix(matrix, &self.qubits, input, &mut output);
            }
        }

        output
    }
}

#[inline]
fn bit(qubit: usize) -> usize {
    1 << qubit
}

/// Apply a `2^k × 2^k` matrix to the `k` target qubits of a full state
fn apply_matrix(
    matrix: &Array2<Complex64>,
    targets: &[usize],
    input: &Array1<Complex64>,
    output: &mut Array1<Complex64>,
) {
    let sub_dimension = 1usize << targets.len();
    let target_mask = targets.iter().fold(0, |acc, &q| acc | bit(q));

    // Full-register index of each sub-state, relative to a base index
    let offsets: Vec<usize> = (0..sub_dimension)
        .map(|s| {
            targets
                .iter()
                .enumerate()
                .filter(|(j, _)| s & (1 << j) != 0)
                .fold(0, |acc, (_, &q)| acc | bit(q))
        })
        .collect();

    let mut local = vec![constants::ZERO; sub_dimension];
    for base in (0..input.len()).filter(|i| i & target_mask == 0) {
        for (s, offset) in offsets.iter().enumerate() {
            local[s] = input[base | offset];
        }
        for (r, offset) in offsets.iter().enumerate() {
            output[base | offset] = (0..sub_dimension).map(|s| matrix[[r, s]] * local[s]).sum();
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;

        let qubits: Vec<String> = self.qubits.iter().map(|q| q.to_string()).collect();
        write!(f, "[{}]", qubits.join(", "))?;

        for parameter in self.parameters() {
            write!(f, "({:.4})", parameter)?;
        }

        Ok(())
    }
}
