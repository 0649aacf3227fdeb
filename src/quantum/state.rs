// src/quantum/state.rs
//! State vector representation
//!
//! A register of `n` qubits is described by `2^n` complex amplitudes. Basis
//! state `k` is the integer whose bit `q` holds the value of qubit `q`
//! (qubit 0 is the least significant bit).
//!
//! Every gate is a total function over the full vector, so memory grows as
//! `16 · 2^n` bytes. [`MAX_QUBITS`] keeps allocations within commodity
//! memory (24 qubits ≈ 256 MiB); larger registers are refused up front
//! rather than failing halfway through a simulation.

use std::fmt::{self, Display};

use ndarray::Array1;
use num_complex::Complex64;
use rand::Rng;
use tracing::{debug, warn};

use super::complex::constants;
use super::gate::Gate;
use crate::error::{QuantumError, Result};

/// Default limit on the number of qubits in a single state vector
pub const MAX_QUBITS: usize = 24;

/// Probabilities below this are omitted from the textual rendering
const DISPLAY_THRESHOLD: f64 = 1e-10;

/// Default tolerance for the "is this state normalized" warning
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// A pure state of a qubit register
#[derive(Clone, Debug, PartialEq)]
pub struct QuantumState {
    qubit_count: usize,
    amplitudes: Array1<Complex64>,
}

impl QuantumState {
    /// Create the |0...0⟩ state for `qubit_count` qubits
    pub fn new(qubit_count: usize) -> Result<Self> {
        Self::with_limit(qubit_count, MAX_QUBITS)
    }

    /// Create the |0...0⟩ state, refusing registers larger than `max_qubits`
    pub fn with_limit(qubit_count: usize, max_qubits: usize) -> Result<Self> {
        Self::basis_state_with_limit(qubit_count, 0, max_qubits)
    }

    /// Create the computational basis state |index⟩
    pub fn basis_state(qubit_count: usize, index: usize) -> Result<Self> {
        Self::basis_state_with_limit(qubit_count, index, MAX_QUBITS)
    }

    /// Create |index⟩, refusing registers larger than `max_qubits`
    pub fn basis_state_with_limit(qubit_count: usize, index: usize, max_qubits: usize) -> Result<Self> {
        let mut data = allocate(qubit_count, max_qubits)?;
        let dimension = data.len();

        if index >= dimension {
            return Err(QuantumError::QubitOutOfRange {
                qubit: index,
                qubit_count,
            });
        }
        data[index] = constants::ONE;

        Ok(QuantumState {
            qubit_count,
            amplitudes: Array1::from(data),
        })
    }

    /// Build a state from explicit amplitudes
    ///
    /// The vector is taken as given; a state that is not normalized is
    /// accepted with a warning so callers can prepare unnormalized inputs.
    pub fn from_amplitudes(qubit_count: usize, amplitudes: Vec<Complex64>) -> Result<Self> {
        Self::from_amplitudes_with(qubit_count, amplitudes, MAX_QUBITS, NORMALIZATION_TOLERANCE)
    }

    /// Build a state from explicit amplitudes with a custom qubit limit and
    /// normalization tolerance
    pub fn from_amplitudes_with(
        qubit_count: usize,
        amplitudes: Vec<Complex64>,
        max_qubits: usize,
        tolerance: f64,
    ) -> Result<Self> {
        if qubit_count > max_qubits {
            return Err(QuantumError::TooManyQubits {
                requested: qubit_count,
                max: max_qubits,
            });
        }

        let expected = 1usize << qubit_count;
        if amplitudes.len() != expected {
            return Err(QuantumError::DimensionMismatch {
                expected,
                actual: amplitudes.len(),
            });
        }

        let state = QuantumState {
            qubit_count,
            amplitudes: Array1::from(amplitudes),
        };

        if !state.is_normalized(tolerance) {
            warn!(norm_sqr = state.norm_sqr(), tolerance, "state prepared from unnormalized amplitudes");
        }

        Ok(state)
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    /// Length of the state vector (2^n)
    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    /// Raw amplitudes
    pub fn amplitudes(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    /// Magnitude of each amplitude, computed on every call
    pub fn magnitudes(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm()).collect()
    }

    /// Probability of each basis state, computed on every call
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Probability of observing basis state `index`
    pub fn probability(&self, index: usize) -> f64 {
        self.amplitudes.get(index).map_or(0.0, |a| a.norm_sqr())
    }

    /// Probability that measuring `qubit` alone yields 1
    pub fn qubit_probability(&self, qubit: usize) -> Result<f64> {
        self.check_qubit(qubit)?;
        let mask = 1usize << qubit;

        Ok(self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum())
    }

    /// Σ |amplitude|²
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.norm_sqr() - 1.0).abs() < tolerance
    }

    /// Apply a gate and renormalize
    ///
    /// A gate that names a qubit outside this register halts with an error
    /// and leaves the state untouched.
    pub fn apply_gate(&mut self, gate: &Gate) -> Result<()> {
        let amplitudes = gate.transform(&self.amplitudes)?;

        debug!(gate = %gate, "applying gate");
        self.amplitudes = amplitudes;
        self.normalize();

        Ok(())
    }

    /// Scale the vector to unit length and return the norm it had
    ///
    /// A zero vector cannot be normalized; it is left unchanged and a
    /// warning is logged.
    pub fn normalize(&mut self) -> f64 {
        let norm = self.norm_sqr().sqrt();

        if norm == 0.0 {
            warn!("cannot normalize a zero-norm state; leaving it unchanged");
            return norm;
        }

        self.amplitudes.mapv_inplace(|a| a / norm);
        norm
    }

    /// Measure every qubit using the thread-local RNG
    pub fn measure(&mut self) -> Result<usize> {
        self.measure_with(&mut rand::thread_rng())
    }

    /// Measure every qubit, collapsing the state onto the observed basis state
    ///
    /// One sample is drawn from `[0, 1)` and the cumulative distribution is
    /// walked in index order; the first index whose cumulative probability
    /// reaches the sample is selected.
    pub fn measure_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize> {
        let sample: f64 = rng.gen();
        let mut cumulative = 0.0;

        let selected = self.amplitudes.iter().position(|a| {
            let p = a.norm_sqr();
            cumulative += p;
            p > 0.0 && cumulative >= sample
        });

        match selected {
            Some(index) => {
                self.collapse_to(index);
                Ok(index)
            }
            None => {
                warn!(sample, cumulative, "measurement did not reach the sampled probability");
                Err(QuantumError::MeasurementFailed(cumulative))
            }
        }
    }

    /// Measure a single qubit, projecting the remaining qubits onto the outcome
    pub fn measure_qubit_with<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> Result<bool> {
        let p_one = self.qubit_probability(qubit)?;
        let outcome = rng.gen::<f64>() < p_one;
        let mask = 1usize << qubit;

        for (i, amplitude) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) != outcome {
                *amplitude = constants::ZERO;
            }
        }
        self.normalize();

        Ok(outcome)
    }

    /// Replace the state with basis state |index⟩
    fn collapse_to(&mut self, index: usize) {
        self.amplitudes.iter_mut().for_each(|a| *a = constants::ZERO);
        self.amplitudes[index] = constants::ONE;
    }

    /// ⟨self|other⟩
    pub fn inner_product(&self, other: &Self) -> Result<Complex64> {
        if self.dimension() != other.dimension() {
            return Err(QuantumError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }

        Ok(self
            .amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// |⟨self|other⟩|², insensitive to global phase
    pub fn fidelity(&self, other: &Self) -> Result<f64> {
        Ok(self.inner_product(other)?.norm_sqr())
    }

    /// Tensor product; `self` occupies the low qubits of the result
    pub fn tensor(&self, other: &Self) -> Result<Self> {
        self.tensor_with_limit(other, MAX_QUBITS)
    }

    /// Tensor product, refusing results wider than `max_qubits`
    pub fn tensor_with_limit(&self, other: &Self, max_qubits: usize) -> Result<Self> {
        let qubit_count = self.qubit_count + other.qubit_count;
        let mut data = allocate(qubit_count, max_qubits)?;

        let low = self.dimension();
        for (j, b) in other.amplitudes.iter().enumerate() {
            for (i, a) in self.amplitudes.iter().enumerate() {
                data[j * low + i] = a * b;
            }
        }

        Ok(QuantumState {
            qubit_count,
            amplitudes: Array1::from(data),
        })
    }

    fn check_qubit(&self, qubit: usize) -> Result<()> {
        if qubit >= self.qubit_count {
            return Err(QuantumError::QubitOutOfRange {
                qubit,
                qubit_count: self.qubit_count,
            });
        }
        Ok(())
    }
}

/// Allocate a zeroed vector of `2^qubit_count` amplitudes
///
/// Allocation failure is reported instead of aborting so that callers can
/// propagate it.
fn allocate(qubit_count: usize, max_qubits: usize) -> Result<Vec<Complex64>> {
    if qubit_count > max_qubits {
        return Err(QuantumError::TooManyQubits {
            requested: qubit_count,
            max: max_qubits,
        });
    }

    let dimension = 1usize << qubit_count;
    let mut data = Vec::new();
    data.try_reserve_exact(dimension)
        .map_err(|_| QuantumError::AllocationFailed { dimension })?;
    data.resize(dimension, constants::ZERO);

    Ok(data)
}

impl Display for QuantumState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}-qubit state:", self.qubit_count)?;

        let mut has_entries = false;
        let width = self.qubit_count.max(1);

        for (i, amp) in self.amplitudes.iter().enumerate() {
            let prob = amp.norm_sqr();
            if prob > DISPLAY_THRESHOLD {
                has_entries = true;
                let bit_string = format!("{:0width$b}", i, width = width);
                writeln!(
                    f,
                    "  ({:.6}{:+.6}i) |{}⟩ [{:.1}%]",
                    amp.re,
                    amp.im,
                    bit_string,
                    prob * 100.0
                )?;
            }
        }

        if !has_entries {
            writeln!(f, "  (zero state)")?;
        }

        Ok(())
    }
}
