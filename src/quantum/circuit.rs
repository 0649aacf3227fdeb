// src/quantum/circuit.rs
//! Quantum circuits
//!
//! A circuit is an ordered list of gates over a fixed-width qubit register.
//! Gates are validated when they are appended, so a built circuit can always
//! be executed. Execution is a replay: every call to
//! [`QuantumCircuit::execute`] starts from a fresh |0...0⟩ state and applies
//! the gates in order. Measurement is never performed by the circuit itself.

use std::fmt;

use tracing::{debug, warn};

use super::fourier;
use super::gate::Gate;
use super::hypergraph::Hypergraph;
use super::registry::{self, GateRecord, GateRegistry};
use super::state::{QuantumState, MAX_QUBITS};
use crate::error::{QuantumError, Result};

/// A quantum circuit consisting of a sequence of gates
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumCircuit {
    qubit_count: usize,
    gates: Vec<Gate>,
    connectivity: Hypergraph,
}

impl QuantumCircuit {
    /// Create a new empty quantum circuit
    pub fn new(qubit_count: usize) -> Self {
        QuantumCircuit {
            qubit_count,
            gates: Vec::new(),
            connectivity: Hypergraph::with_nodes(qubit_count),
        }
    }

    /// Widen the register by one qubit and return its index
    pub fn add_qubit(&mut self) -> usize {
        let index = self.qubit_count;
        self.qubit_count += 1;
        self.connectivity.add_node(index);
        index
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Which qubits have shared a gate so far
    pub fn connectivity(&self) -> &Hypergraph {
        &self.connectivity
    }

    /// Append a gate after checking its qubit indices
    ///
    /// A rejected gate is logged and leaves the circuit unchanged.
    pub fn add_gate(&mut self, gate: Gate) -> Result<()> {
        if let Err(e) = gate.validate(self.qubit_count) {
            warn!(gate = %gate, error = %e, "rejecting gate");
            return Err(e);
        }

        self.connectivity.connect_nodes(gate.qubits());
        self.gates.push(gate);
        Ok(())
    }

    /// Append the gate described by one line of the text protocol
    ///
    /// Returns whether a gate was added; unknown operators are skipped.
    pub fn add_instruction(&mut self, text: &str, registry: &GateRegistry) -> Result<bool> {
        match registry.parse_instruction(text, 1)? {
            Some(gate) => self.add_gate(gate).map(|_| true),
            None => Ok(false),
        }
    }

    /// Append every gate of a program, or none of them if any line is invalid
    ///
    /// Returns the number of gates added.
    pub fn add_program(&mut self, program: &str, registry: &GateRegistry) -> Result<usize> {
        let gates = registry.parse_program(program)?;

        for gate in &gates {
            if let Err(e) = gate.validate(self.qubit_count) {
                warn!(gate = %gate, error = %e, "rejecting program");
                return Err(e);
            }
        }

        let count = gates.len();
        for gate in gates {
            self.connectivity.connect_nodes(gate.qubits());
            self.gates.push(gate);
        }

        Ok(count)
    }

    /// Run the circuit on a fresh |0...0⟩ state
    pub fn execute(&self) -> Result<QuantumState> {
        self.execute_with_limit(MAX_QUBITS)
    }

    /// Run the circuit, refusing registers wider than `max_qubits`
    pub fn execute_with_limit(&self, max_qubits: usize) -> Result<QuantumState> {
        let mut state = QuantumState::with_limit(self.qubit_count, max_qubits)?;
        self.apply_to(&mut state)?;
        Ok(state)
    }

    /// Apply the gates, in order, to an existing state
    pub fn apply_to(&self, state: &mut QuantumState) -> Result<()> {
        debug!(
            qubits = self.qubit_count,
            gates = self.gates.len(),
            "executing circuit"
        );

        for gate in &self.gates {
            state.apply_gate(gate)?;
        }

        Ok(())
    }

    /// Number of layers when gates on disjoint qubits share a layer
    pub fn depth(&self) -> usize {
        let mut levels = vec![0usize; self.qubit_count];

        for gate in &self.gates {
            let level = gate.qubits().iter().map(|&q| levels[q]).max().unwrap_or(0) + 1;
            for &q in gate.qubits() {
                levels[q] = level;
            }
        }

        levels.into_iter().max().unwrap_or(0)
    }

    /// The inverse circuit: adjoint gates in reverse order
    pub fn adjoint(&self) -> Self {
        let mut circuit = QuantumCircuit::new(self.qubit_count);
        for gate in self.gates.iter().rev() {
            circuit.connectivity.connect_nodes(gate.qubits());
            circuit.gates.push(gate.adjoint());
        }
        circuit
    }

    /// Append all gates of `other`, which must not be wider than `self`
    pub fn append(&mut self, other: &QuantumCircuit) -> Result<()> {
        if other.qubit_count > self.qubit_count {
            return Err(QuantumError::DimensionMismatch {
                expected: self.qubit_count,
                actual: other.qubit_count,
            });
        }

        for gate in &other.gates {
            self.add_gate(gate.clone())?;
        }

        Ok(())
    }

    /// Structural records of every gate, for storage
    pub fn records(&self) -> Vec<GateRecord> {
        self.gates.iter().map(Gate::record).collect()
    }

    /// Rebuild a circuit from stored records
    pub fn from_records(
        qubit_count: usize,
        records: &[GateRecord],
        registry: &GateRegistry,
    ) -> Result<Self> {
        let mut circuit = QuantumCircuit::new(qubit_count);
        for record in records {
            circuit.add_gate(registry.resolve(record)?)?;
        }
        Ok(circuit)
    }

    /// The circuit in the text protocol, one gate per line
    pub fn to_program(&self) -> String {
        registry::to_program(&self.gates)
    }
}

impl fmt::Display for QuantumCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}-qubit circuit, {} gates, depth {}",
            self.qubit_count,
            self.gates.len(),
            self.depth()
        )?;
        for (i, gate) in self.gates.iter().enumerate() {
            writeln!(f, "  {:>3}: {}", i, gate)?;
        }
        Ok(())
    }
}

/// Builder for constructing quantum circuits
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    circuit: QuantumCircuit,
}

impl CircuitBuilder {
    /// Create a new circuit builder
    pub fn new(qubit_count: usize) -> Self {
        CircuitBuilder {
            circuit: QuantumCircuit::new(qubit_count),
        }
    }

    /// Finish building and return the circuit
    pub fn build(self) -> QuantumCircuit {
        self.circuit
    }

    pub fn add_gate(&mut self, gate: Gate) -> Result<()> {
        self.circuit.add_gate(gate)
    }

    pub fn h(&mut self, qubit: usize) -> Result<()> {
        self.add_gate(Gate::hadamard(qubit))
    }

    pub fn x(&mut self, qubit: usize) -> Result<()> {
        self.add_gate(Gate::pauli_x(qubit))
    }

    pub fn y(&mut self, qubit: usize) -> Result<()> {
        self.add_gate(Gate::pauli_y(qubit))
    }

    pub fn z(&mut self, qubit: usize) -> Result<()> {
        self.add_gate(Gate::pauli_z(qubit))
    }

    pub fn cnot(&mut self, control: usize, target: usize) -> Result<()> {
        self.add_gate(Gate::cnot(control, target))
    }

    pub fn rotation(&mut self, qubit: usize, theta: f64) -> Result<()> {
        self.add_gate(Gate::rotation(qubit, theta))
    }

    pub fn controlled_rotation(&mut self, control: usize, target: usize, theta: f64) -> Result<()> {
        self.add_gate(Gate::controlled_rotation(control, target, theta))
    }

    pub fn swap(&mut self, qubit1: usize, qubit2: usize) -> Result<()> {
        self.add_gate(Gate::swap(qubit1, qubit2))
    }

    /// Entangle two qubits into (|00⟩ + |11⟩)/√2
    pub fn bell_pair(&mut self, qubit1: usize, qubit2: usize) -> Result<()> {
        self.h(qubit1)?;
        self.cnot(qubit1, qubit2)
    }

    /// Quantum Fourier transform over the whole register
    pub fn qft(&mut self) -> Result<()> {
        fourier::check_width(self.circuit.qubit_count)?;
        for gate in fourier::qft_gates(self.circuit.qubit_count) {
            self.add_gate(gate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_gate_leaves_circuit_unchanged() {
        let mut circuit = QuantumCircuit::new(2);
        circuit.add_gate(Gate::hadamard(0)).unwrap();

        let result = circuit.add_gate(Gate::cnot(0, 2));
        assert_eq!(
            result,
            Err(QuantumError::QubitOutOfRange { qubit: 2, qubit_count: 2 })
        );
        assert_eq!(circuit.gate_count(), 1);
        assert_eq!(circuit.connectivity().edge_count(), 0);
    }

    #[test]
    fn test_add_qubit_extends_valid_range() {
        let mut circuit = QuantumCircuit::new(1);
        assert!(circuit.add_gate(Gate::cnot(0, 1)).is_err());

        assert_eq!(circuit.add_qubit(), 1);
        circuit.add_gate(Gate::cnot(0, 1)).unwrap();
        assert!(circuit.connectivity().are_connected(0, 1));
    }

    #[test]
    fn test_program_is_all_or_nothing() {
        let registry = GateRegistry::standard();
        let mut circuit = QuantumCircuit::new(2);

        assert!(circuit.add_program("H 0\nCNOT 0 5\n", &registry).is_err());
        assert!(circuit.is_empty());

        let added = circuit.add_program("H 0\nMYSTERY 1\nCNOT 0 1\n", &registry).unwrap();
        assert_eq!(added, 2);
        assert_eq!(circuit.gates(), &[Gate::hadamard(0), Gate::cnot(0, 1)]);
    }

    #[test]
    fn test_depth() {
        let mut builder = CircuitBuilder::new(3);
        builder.h(0).unwrap();
        builder.h(1).unwrap();
        builder.h(2).unwrap();
        builder.cnot(0, 1).unwrap();
        builder.x(2).unwrap();
        builder.cnot(1, 2).unwrap();

        assert_eq!(builder.build().depth(), 3);
        assert_eq!(QuantumCircuit::new(2).depth(), 0);
    }

    #[test]
    fn test_append_checks_width() {
        let mut wide = QuantumCircuit::new(3);
        let mut narrow = QuantumCircuit::new(2);
        narrow.add_gate(Gate::swap(0, 1)).unwrap();

        wide.append(&narrow).unwrap();
        assert_eq!(wide.gate_count(), 1);
        assert!(narrow.append(&wide).is_err());
    }

    #[test]
    fn test_display_lists_gates() {
        let mut builder = CircuitBuilder::new(2);
        builder.bell_pair(0, 1).unwrap();
        let text = builder.build().to_string();

        assert!(text.starts_with("2-qubit circuit, 2 gates, depth 2"));
        assert!(text.contains("CNOT[0, 1]"));
    }
}
