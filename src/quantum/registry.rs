// src/quantum/registry.rs
//! Gate persistence and the text protocol
//!
//! Gates are stored as [`GateRecord`]s: the name, the number of qubits, the
//! qubit indices and any angle parameters. The transformation itself is not
//! stored. Loading a record looks the name up in a [`GateRegistry`], so any
//! custom gate must be registered again before records naming it can be
//! resolved.
//!
//! The same registry drives the line-oriented text format
//! `"<OP> <qubit...> [<angle>...]"`, e.g. `H 0`, `CNOT 0 1`, `R 0 1.5708`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::gate::{Gate, GateKind};
use crate::error::{QuantumError, Result};

/// Serializable projection of a gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRecord {
    pub name: String,
    pub qubit_count: usize,
    pub qubits: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<f64>,
}

/// Builds a gate from qubit indices and parameters
pub type GateFactory = Arc<dyn Fn(&[usize], &[f64]) -> Result<Gate> + Send + Sync>;

/// A registered gate: its operand shape and how to build it
#[derive(Clone)]
pub struct GateDefinition {
    pub qubits: usize,
    pub parameters: usize,
    factory: GateFactory,
}

impl GateDefinition {
    pub fn new<F>(qubits: usize, parameters: usize, factory: F) -> Self
    where
        F: Fn(&[usize], &[f64]) -> Result<Gate> + Send + Sync + 'static,
    {
        GateDefinition {
            qubits,
            parameters,
            factory: Arc::new(factory),
        }
    }

    /// Build the gate after checking operand counts
    pub fn build(&self, name: &str, qubits: &[usize], parameters: &[f64]) -> Result<Gate> {
        if qubits.len() != self.qubits {
            return Err(QuantumError::ArityMismatch {
                gate: name.to_string(),
                expected: self.qubits,
                actual: qubits.len(),
            });
        }
        if parameters.len() != self.parameters {
            return Err(QuantumError::InvalidOperand {
                line: 0,
                token: format!("{:?}", parameters),
                reason: format!("{} expects {} parameter(s)", name, self.parameters),
            });
        }

        (self.factory)(qubits, parameters)
    }
}

impl fmt::Debug for GateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateDefinition")
            .field("qubits", &self.qubits)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Name → gate factory lookup
///
/// Names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct GateRegistry {
    definitions: HashMap<String, GateDefinition>,
}

impl GateRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in gate
    pub fn standard() -> Self {
        let mut registry = GateRegistry::new();

        registry.register("H", GateDefinition::new(1, 0, |q, _| Ok(Gate::hadamard(q[0]))));
        registry.register("X", GateDefinition::new(1, 0, |q, _| Ok(Gate::pauli_x(q[0]))));
        registry.register("Y", GateDefinition::new(1, 0, |q, _| Ok(Gate::pauli_y(q[0]))));
        registry.register("Z", GateDefinition::new(1, 0, |q, _| Ok(Gate::pauli_z(q[0]))));

        let cnot = GateDefinition::new(2, 0, |q, _| Gate::new(GateKind::Cnot, q.to_vec()));
        registry.register("CNOT", cnot.clone());
        registry.register("CX", cnot);

        let rotation = GateDefinition::new(1, 1, |q, p| Ok(Gate::rotation(q[0], p[0])));
        registry.register("R", rotation.clone());
        registry.register("PHASE", rotation);

        let controlled = GateDefinition::new(2, 1, |q, p| {
            Gate::new(GateKind::ControlledRotation(p[0]), q.to_vec())
        });
        registry.register("CR", controlled.clone());
        registry.register("CPHASE", controlled);

        registry.register(
            "SWAP",
            GateDefinition::new(2, 0, |q, _| Gate::new(GateKind::Swap, q.to_vec())),
        );

        registry
    }

    /// Register (or replace) a gate under `name`
    pub fn register(&mut self, name: &str, definition: GateDefinition) {
        self.definitions.insert(name.to_uppercase(), definition);
    }

    /// Register a named unitary so records and program lines can refer to it
    pub fn register_custom(&mut self, name: &str, matrix: Array2<Complex64>) -> Result<()> {
        let qubits = matrix.nrows().trailing_zeros() as usize;
        let gate_name = name.to_string();

        // Reject bad matrices now rather than at first use
        Gate::custom(gate_name.clone(), matrix.clone(), (0..qubits).collect())?;

        self.register(
            name,
            GateDefinition::new(qubits, 0, move |q, _| {
                Gate::custom(gate_name.clone(), matrix.clone(), q.to_vec())
            }),
        );

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GateDefinition> {
        self.definitions.get(&name.to_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Rebuild a gate from its stored record
    pub fn resolve(&self, record: &GateRecord) -> Result<Gate> {
        let definition = self
            .get(&record.name)
            .ok_or_else(|| QuantumError::UnknownGate(record.name.clone()))?;

        if record.qubit_count != record.qubits.len() {
            return Err(QuantumError::ArityMismatch {
                gate: record.name.clone(),
                expected: record.qubit_count,
                actual: record.qubits.len(),
            });
        }

        definition.build(&record.name, &record.qubits, &record.parameters)
    }

    /// Parse one line of the text protocol
    ///
    /// Returns `Ok(None)` for blank lines, `#` comments and unknown
    /// operators (which are logged and skipped). Operands that are missing,
    /// surplus or unparsable are errors; `line` is only used for reporting.
    pub fn parse_instruction(&self, text: &str, line: usize) -> Result<Option<Gate>> {
        let text = text.split('#').next().unwrap_or("").trim();
        let mut tokens = text.split_whitespace();

        let operator = match tokens.next() {
            Some(op) => op.to_uppercase(),
            None => return Ok(None),
        };

        let definition = match self.definitions.get(&operator) {
            Some(definition) => definition,
            None => {
                warn!(line, operator = %operator, "unknown gate operation; skipping");
                return Ok(None);
            }
        };

        let operands: Vec<&str> = tokens.collect();
        let expected = definition.qubits + definition.parameters;
        if operands.len() != expected {
            return Err(QuantumError::InvalidOperand {
                line,
                token: text.to_string(),
                reason: format!(
                    "{} expects {} qubit(s) and {} angle(s), got {} operand(s)",
                    operator,
                    definition.qubits,
                    definition.parameters,
                    operands.len()
                ),
            });
        }

        let (qubit_tokens, parameter_tokens) = operands.split_at(definition.qubits);

        let qubits = qubit_tokens
            .iter()
            .map(|token| {
                token.parse::<usize>().map_err(|e| QuantumError::InvalidOperand {
                    line,
                    token: token.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let parameters = parameter_tokens
            .iter()
            .map(|token| match token.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(QuantumError::InvalidOperand {
                    line,
                    token: token.to_string(),
                    reason: "angle must be finite".to_string(),
                }),
                Err(e) => Err(QuantumError::InvalidOperand {
                    line,
                    token: token.to_string(),
                    reason: e.to_string(),
                }),
            })
            .collect::<Result<Vec<f64>>>()?;

        definition.build(&operator, &qubits, &parameters).map(Some)
    }

    /// Parse a whole program, one instruction per line
    pub fn parse_program(&self, program: &str) -> Result<Vec<Gate>> {
        let mut gates = Vec::new();

        for (index, text) in program.lines().enumerate() {
            if let Some(gate) = self.parse_instruction(text, index + 1)? {
                gates.push(gate);
            }
        }

        Ok(gates)
    }
}

/// Render gates back into the text protocol
pub fn to_program(gates: &[Gate]) -> String {
    gates
        .iter()
        .map(|gate| {
            let mut tokens = vec![gate.name().to_string()];
            tokens.extend(gate.qubits().iter().map(|q| q.to_string()));
            tokens.extend(gate.parameters().iter().map(|p| p.to_string()));
            tokens.join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_parse_is_case_insensitive() {
        let registry = GateRegistry::standard();
        let gate = registry.parse_instruction("cnot 0 1", 1).unwrap().unwrap();
        assert_eq!(gate, Gate::cnot(0, 1));

        let gate = registry.parse_instruction("  R 0 1.5708  ", 1).unwrap().unwrap();
        assert_eq!(gate, Gate::rotation(0, 1.5708));
    }

    #[test]
    fn test_unknown_and_blank_lines_are_skipped() {
        let registry = GateRegistry::standard();
        assert_eq!(registry.parse_instruction("FOO 0", 1), Ok(None));
        assert_eq!(registry.parse_instruction("", 2), Ok(None));
        assert_eq!(registry.parse_instruction("# comment", 3), Ok(None));
    }

    #[test]
    fn test_malformed_operands_are_errors() {
        let registry = GateRegistry::standard();
        assert!(matches!(
            registry.parse_instruction("H", 4),
            Err(QuantumError::InvalidOperand { line: 4, .. })
        ));
        assert!(matches!(
            registry.parse_instruction("CNOT 0 x", 5),
            Err(QuantumError::InvalidOperand { line: 5, .. })
        ));
        assert!(matches!(
            registry.parse_instruction("R 0", 6),
            Err(QuantumError::InvalidOperand { .. })
        ));
        assert!(matches!(
            registry.parse_instruction("R 0 NaN", 7),
            Err(QuantumError::InvalidOperand { .. })
        ));
        assert_eq!(
            registry.parse_instruction("SWAP 1 1", 8),
            Err(QuantumError::DuplicateQubit(1))
        );
    }

    #[test]
    fn test_program_round_trip() {
        let registry = GateRegistry::standard();
        let gates = vec![
            Gate::hadamard(0),
            Gate::controlled_rotation(1, 0, FRAC_PI_2),
            Gate::swap(0, 1),
        ];

        let text = to_program(&gates);
        assert_eq!(registry.parse_program(&text).unwrap(), gates);
    }

    #[test]
    fn test_resolve_unknown_record() {
        let registry = GateRegistry::standard();
        let record = GateRecord {
            name: "TOFFOLI".to_string(),
            qubit_count: 3,
            qubits: vec![0, 1, 2],
            parameters: Vec::new(),
        };
        assert_eq!(
            registry.resolve(&record),
            Err(QuantumError::UnknownGate("TOFFOLI".to_string()))
        );
    }

    #[test]
    fn test_resolve_checks_record_consistency() {
        let registry = GateRegistry::standard();
        let record = GateRecord {
            name: "H".to_string(),
            qubit_count: 2,
            qubits: vec![0],
            parameters: Vec::new(),
        };
        assert!(matches!(
            registry.resolve(&record),
            Err(QuantumError::ArityMismatch { .. })
        ));
    }
}
