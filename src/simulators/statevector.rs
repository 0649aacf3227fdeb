//! Statevector simulator
//!
//! Wraps a [`QuantumState`] together with its own random number generator,
//! so runs are reproducible when a seed is configured.
use std::collections::BTreeMap;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::SimulatorConfig;
use crate::error::{QuantumError, Result};
use crate::quantum::circuit::QuantumCircuit;
use crate::quantum::gate::Gate;
use crate::quantum::state::{QuantumState, MAX_QUBITS, NORMALIZATION_TOLERANCE};

/// A statevector simulator for quantum circuits
#[derive(Clone, Debug)]
pub struct StatevectorSimulator {
    /// The current state of the simulator
    state: QuantumState,
    /// Random number generator for measurements
    rng: StdRng,
    /// Largest register the simulator will allocate
    max_qubits: usize,
    /// Allowed deviation of Σ|amplitude|² from 1
    normalization_tolerance: f64,
}

impl StatevectorSimulator {
    /// Create a new statevector simulator with the specified number of qubits
    pub fn new(qubit_count: usize) -> Result<Self> {
        Ok(StatevectorSimulator {
            state: QuantumState::new(qubit_count)?,
            rng: StdRng::from_entropy(),
            max_qubits: MAX_QUBITS,
            normalization_tolerance: NORMALIZATION_TOLERANCE,
        })
    }

    /// Create a simulator honoring the limits and seed of `config`
    pub fn with_config(qubit_count: usize, config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;

        Ok(StatevectorSimulator {
            state: QuantumState::with_limit(qubit_count, config.max_qubits)?,
            rng: seeded_rng(config.seed),
            max_qubits: config.max_qubits,
            normalization_tolerance: config.normalization_tolerance,
        })
    }

    /// Create a simulator with a fixed measurement seed
    pub fn with_seed(qubit_count: usize, seed: u64) -> Result<Self> {
        Ok(StatevectorSimulator {
            state: QuantumState::new(qubit_count)?,
            rng: StdRng::seed_from_u64(seed),
            max_qubits: MAX_QUBITS,
            normalization_tolerance: NORMALIZATION_TOLERANCE,
        })
    }

    /// Create a simulator from an existing state vector
    pub fn from_state(state: QuantumState) -> Self {
        StatevectorSimulator {
            state,
            rng: StdRng::from_entropy(),
            max_qubits: MAX_QUBITS,
            normalization_tolerance: NORMALIZATION_TOLERANCE,
        }
    }

    /// Get the current state vector
    pub fn state(&self) -> &QuantumState {
        &self.state
    }

    /// Replace the state vector
    pub fn set_state(&mut self, state: QuantumState) {
        if !state.is_normalized(self.normalization_tolerance) {
            warn!(norm_sqr = state.norm_sqr(), "simulator given an unnormalized state");
        }
        self.state = state;
    }

    /// Replace the state with explicit amplitudes under the configured limits
    pub fn load_amplitudes(&mut self, qubit_count: usize, amplitudes: Vec<Complex64>) -> Result<()> {
        self.state = QuantumState::from_amplitudes_with(
            qubit_count,
            amplitudes,
            self.max_qubits,
            self.normalization_tolerance,
        )?;
        Ok(())
    }

    /// Whether the current state is normalized within the configured tolerance
    pub fn is_normalized(&self) -> bool {
        self.state.is_normalized(self.normalization_tolerance)
    }

    /// Reset the simulator to the |0...0⟩ state
    pub fn reset(&mut self) -> Result<()> {
        self.state = QuantumState::with_limit(self.state.qubit_count(), self.max_qubits)?;
        Ok(())
    }

    /// Get the number of qubits in the simulator
    pub fn qubit_count(&self) -> usize {
        self.state.qubit_count()
    }

    pub fn apply_gate(&mut self, gate: &Gate) -> Result<()> {
        self.state.apply_gate(gate)
    }

    /// Apply every gate of `circuit` to the current state
    pub fn run_circuit(&mut self, circuit: &QuantumCircuit) -> Result<()> {
        if circuit.qubit_count() > self.qubit_count() {
            return Err(QuantumError::DimensionMismatch {
                expected: self.qubit_count(),
                actual: circuit.qubit_count(),
            });
        }

        circuit.apply_to(&mut self.state)
    }

    /// Reset, then run `circuit` from |0...0⟩
    pub fn simulate(&mut self, circuit: &QuantumCircuit) -> Result<&QuantumState> {
        self.reset()?;
        self.run_circuit(circuit)?;
        Ok(&self.state)
    }

    /// Probability of every basis state
    pub fn probabilities(&self) -> Vec<f64> {
        self.state.probabilities()
    }

    /// Measure the whole register, collapsing the state
    pub fn measure(&mut self) -> Result<usize> {
        let outcome = self.state.measure_with(&mut self.rng)?;
        debug!(outcome, "measured register");
        Ok(outcome)
    }

    /// Measure a single qubit, collapsing the state
    pub fn measure_qubit(&mut self, qubit: usize) -> Result<bool> {
        self.state.measure_qubit_with(qubit, &mut self.rng)
    }

    /// Sample `shots` measurements without disturbing the state
    ///
    /// Returns how often each basis state was observed.
    pub fn sample_counts(&mut self, shots: usize) -> Result<BTreeMap<usize, usize>> {
        let probabilities = self.state.probabilities();
        let cumulative: Vec<f64> = probabilities
            .iter()
            .scan(0.0, |total, p| {
                *total += p;
                Some(*total)
            })
            .collect();

        let mut counts = BTreeMap::new();
        for _ in 0..shots {
            let sample: f64 = self.rng.gen();
            let mut index = cumulative.partition_point(|&c| c < sample);
            while index < probabilities.len() && probabilities[index] == 0.0 {
                index += 1;
            }

            if index >= probabilities.len() {
                let total = cumulative.last().copied().unwrap_or(0.0);
                warn!(sample, total, "sample fell outside the cumulative distribution");
                return Err(QuantumError::MeasurementFailed(total));
            }
            *counts.entry(index).or_insert(0) += 1;
        }

        Ok(counts)
    }
}

/// An RNG seeded from `seed`, or from the OS when no seed is given
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
