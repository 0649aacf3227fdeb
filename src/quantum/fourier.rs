// src/quantum/fourier.rs
//! Quantum Fourier transform
//!
//! For `n` qubits: Hadamard on qubit `i`, then a controlled phase of
//! `π / 2^(j-i)` between qubit `j` and qubit `i` for every later `j`, and
//! finally a bit reversal made of pairwise swaps.
//!
//! The circuit treats qubit 0 as the most significant bit of the Fourier
//! index, while basis states number qubit 0 as the least significant bit.
//! With `rev` reversing the `n` bits of an index and `N = 2^n`, basis state
//! `|x⟩` therefore maps to amplitude `exp(2πi · rev(x) · rev(k) / N) / √N`
//! at index `k`.

use std::f64::consts::PI;

use super::circuit::QuantumCircuit;
use super::gate::Gate;
use super::state::{QuantumState, MAX_QUBITS};
use crate::error::{QuantumError, Result};

/// The QFT gate sequence for an `n`-qubit register
pub fn qft_gates(qubit_count: usize) -> Vec<Gate> {
    let mut gates = Vec::new();

    for i in 0..qubit_count {
        gates.push(Gate::hadamard(i));
        for j in (i + 1)..qubit_count {
            let theta = PI / 2f64.powi((j - i) as i32);
            gates.push(Gate::controlled_rotation(j, i, theta));
        }
    }

    for i in 0..qubit_count / 2 {
        gates.push(Gate::swap(i, qubit_count - 1 - i));
    }

    gates
}

/// Refuse registers that could never be executed before building O(n²) gates
pub(crate) fn check_width(qubit_count: usize) -> Result<()> {
    if qubit_count > MAX_QUBITS {
        return Err(QuantumError::TooManyQubits {
            requested: qubit_count,
            max: MAX_QUBITS,
        });
    }
    Ok(())
}

/// Circuit performing the QFT
pub fn qft_circuit(qubit_count: usize) -> Result<QuantumCircuit> {
    check_width(qubit_count)?;

    let mut circuit = QuantumCircuit::new(qubit_count);
    for gate in qft_gates(qubit_count) {
        circuit.add_gate(gate)?;
    }
    Ok(circuit)
}

/// Circuit performing the inverse QFT
pub fn inverse_qft_circuit(qubit_count: usize) -> Result<QuantumCircuit> {
    Ok(qft_circuit(qubit_count)?.adjoint())
}

/// QFT applied to |0...0⟩
pub fn apply_qft(qubit_count: usize) -> Result<QuantumState> {
    qft_circuit(qubit_count)?.execute()
}

/// Apply the QFT in place to `state`
pub fn apply_qft_to(state: &mut QuantumState) -> Result<()> {
    for gate in qft_gates(state.qubit_count()) {
        state.apply_gate(&gate)?;
    }
    Ok(())
}
