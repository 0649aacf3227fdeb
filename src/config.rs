//! Simulator configuration
//!
//! Settings can be built in code or loaded from a TOML document:
//!
//! ```toml
//! max_qubits = 20
//! max_parallelism = 4
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QuantumError, Result};
use crate::quantum::state::{MAX_QUBITS, NORMALIZATION_TOLERANCE};

/// Hard ceiling on `max_qubits`; 2^30 amplitudes already need 16 GiB
const ABSOLUTE_MAX_QUBITS: usize = 30;

/// Settings shared by the simulators and the parallel drivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Largest register a state vector may be allocated for
    pub max_qubits: usize,

    /// Number of worker threads used by the parallel drivers
    pub max_parallelism: usize,

    /// Tolerance used when checking that a state is normalized
    pub normalization_tolerance: f64,

    /// Seed for measurement randomness; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            max_qubits: MAX_QUBITS,
            max_parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            normalization_tolerance: NORMALIZATION_TOLERANCE,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Parse and validate a configuration from TOML
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SimulatorConfig =
            toml::from_str(source).map_err(|e| QuantumError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_qubits == 0 || self.max_qubits > ABSOLUTE_MAX_QUBITS {
            return Err(QuantumError::Config(format!(
                "max_qubits must be in 1..={}, got {}",
                ABSOLUTE_MAX_QUBITS, self.max_qubits
            )));
        }
        if self.max_parallelism == 0 {
            return Err(QuantumError::Config(
                "max_parallelism must be at least 1".to_string(),
            ));
        }
        if !(self.normalization_tolerance > 0.0) {
            return Err(QuantumError::Config(format!(
                "normalization_tolerance must be positive, got {}",
                self.normalization_tolerance
            )));
        }
        Ok(())
    }
}
