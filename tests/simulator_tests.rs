use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;

use qsim::quantum::circuit::CircuitBuilder;
use qsim::quantum::{Gate, QuantumState};
use qsim::simulators::StatevectorSimulator;
use qsim::{QuantumError, SimulatorConfig};

/// Helper function for comparing f64 with tolerance
fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn bell_circuit() -> qsim::quantum::QuantumCircuit {
    let mut builder = CircuitBuilder::new(2);
    builder.bell_pair(0, 1).unwrap();
    builder.build()
}

#[test]
fn test_measurement_of_definite_state() {
    let mut rng = StdRng::seed_from_u64(1);

    for k in 0..8 {
        for _ in 0..20 {
            let mut state = QuantumState::basis_state(3, k).unwrap();
            assert_eq!(state.measure_with(&mut rng).unwrap(), k);
            assert_eq!(state, QuantumState::basis_state(3, k).unwrap());
        }
    }
}

#[test]
fn test_measurement_collapses_state() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut state = bell_circuit().execute().unwrap();

    let outcome = state.measure_with(&mut rng).unwrap();
    assert!(outcome == 0 || outcome == 3);
    assert!(approx_eq(state.probability(outcome), 1.0, 1e-12));
    assert!(approx_eq(state.norm_sqr(), 1.0, 1e-12));

    // A collapsed state measures the same way every time
    for _ in 0..10 {
        assert_eq!(state.measure_with(&mut rng).unwrap(), outcome);
    }
}

#[test]
fn test_measurement_skips_zero_probability_prefix() {
    let amplitudes = vec![
        Complex64::new(0.0, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(0.0, 1.0),
        Complex64::new(0.0, 0.0),
    ];
    let mut rng = StdRng::seed_from_u64(4);

    for _ in 0..50 {
        let mut state = QuantumState::from_amplitudes(2, amplitudes.clone()).unwrap();
        assert_eq!(state.measure_with(&mut rng).unwrap(), 2);
    }
}

#[test]
fn test_measurement_of_zero_vector_fails() {
    let mut state = QuantumState::from_amplitudes(1, vec![Complex64::new(0.0, 0.0); 2]).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    assert!(matches!(
        state.measure_with(&mut rng),
        Err(QuantumError::MeasurementFailed(_))
    ));
}

#[test]
fn test_simulator_bell_state_statistics() {
    let mut simulator = StatevectorSimulator::with_seed(2, 2024).unwrap();
    simulator.run_circuit(&bell_circuit()).unwrap();

    let probabilities = simulator.probabilities();
    assert!(approx_eq(probabilities[0], 0.5, 1e-10));
    assert!(approx_eq(probabilities[3], 0.5, 1e-10));

    let counts = simulator.sample_counts(2000).unwrap();
    assert_eq!(counts.keys().copied().collect::<Vec<_>>(), vec![0, 3]);
    assert_eq!(counts.values().sum::<usize>(), 2000);
    assert!(counts[&0] > 850 && counts[&0] < 1150);

    // Sampling leaves the state alone
    assert!(approx_eq(simulator.probabilities()[3], 0.5, 1e-10));
}

#[test]
fn test_simulator_is_reproducible_with_seed() {
    let run = |seed| {
        let mut simulator = StatevectorSimulator::with_seed(2, seed).unwrap();
        (0..16)
            .map(|_| {
                simulator.simulate(&bell_circuit()).unwrap();
                simulator.measure().unwrap()
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(7), run(7));
}

#[test]
fn test_simulator_entanglement_correlation() {
    let mut simulator = StatevectorSimulator::with_seed(3, 31).unwrap();

    for _ in 0..20 {
        simulator.simulate(&bell_circuit()).unwrap();

        let first = simulator.measure_qubit(0).unwrap();
        // After measuring qubit 0, qubit 1 is fixed to the same value
        let p_one = simulator.state().qubit_probability(1).unwrap();
        assert!(approx_eq(p_one, if first { 1.0 } else { 0.0 }, 1e-10));
        assert_eq!(simulator.measure_qubit(1).unwrap(), first);

        // Qubit 2 was never touched
        assert!(approx_eq(simulator.state().qubit_probability(2).unwrap(), 0.0, 1e-10));
    }
}

#[test]
fn test_simulator_rejects_wider_circuit() {
    let mut simulator = StatevectorSimulator::new(1).unwrap();
    assert!(matches!(
        simulator.run_circuit(&bell_circuit()),
        Err(QuantumError::DimensionMismatch { expected: 1, actual: 2 })
    ));
    assert!(simulator.apply_gate(&Gate::pauli_x(1)).is_err());
}

#[test]
fn test_simulator_reset_and_config() {
    let config = SimulatorConfig {
        max_qubits: 4,
        ..SimulatorConfig::default()
    }
    .with_seed(5);

    assert!(matches!(
        StatevectorSimulator::with_config(5, &config),
        Err(QuantumError::TooManyQubits { requested: 5, max: 4 })
    ));

    let mut simulator = StatevectorSimulator::with_config(3, &config).unwrap();
    simulator.apply_gate(&Gate::pauli_x(2)).unwrap();
    assert!(approx_eq(simulator.probabilities()[4], 1.0, 1e-12));

    simulator.reset().unwrap();
    assert_eq!(simulator.state(), &QuantumState::new(3).unwrap());
    assert_eq!(simulator.qubit_count(), 3);
}

#[test]
fn test_simulator_uses_configured_tolerance() {
    // Σ|a|² = 1.21
    let amplitudes = vec![Complex64::new(1.1, 0.0), Complex64::new(0.0, 0.0)];

    let mut strict = StatevectorSimulator::new(1).unwrap();
    strict.load_amplitudes(1, amplitudes.clone()).unwrap();
    assert!(!strict.is_normalized());

    let loose_config = SimulatorConfig {
        normalization_tolerance: 0.5,
        ..SimulatorConfig::default()
    };
    let mut loose = StatevectorSimulator::with_config(1, &loose_config).unwrap();
    loose.load_amplitudes(1, amplitudes).unwrap();
    assert!(loose.is_normalized());

    // Gates renormalize the state
    strict.apply_gate(&Gate::pauli_x(0)).unwrap();
    assert!(strict.is_normalized());
}

#[test]
fn test_load_amplitudes_honors_qubit_limit() {
    let config = SimulatorConfig {
        max_qubits: 2,
        ..SimulatorConfig::default()
    };
    let mut simulator = StatevectorSimulator::with_config(1, &config).unwrap();

    assert_eq!(
        simulator.load_amplitudes(3, vec![Complex64::new(0.0, 0.0); 8]),
        Err(QuantumError::TooManyQubits { requested: 3, max: 2 })
    );
    assert_eq!(simulator.qubit_count(), 1);
}

#[test]
fn test_deutsch_jozsa() {
    // Constant oracle: the query qubit ends in |0⟩
    let mut builder = CircuitBuilder::new(2);
    builder.x(1).unwrap();
    builder.h(0).unwrap();
    builder.h(1).unwrap();
    builder.h(0).unwrap();
    let state = builder.build().execute().unwrap();
    assert!(approx_eq(state.qubit_probability(0).unwrap(), 0.0, 1e-10));

    // Balanced oracle f(x) = x: the query qubit ends in |1⟩
    let mut builder = CircuitBuilder::new(2);
    builder.x(1).unwrap();
    builder.h(0).unwrap();
    builder.h(1).unwrap();
    builder.cnot(0, 1).unwrap();
    builder.h(0).unwrap();
    let state = builder.build().execute().unwrap();
    assert!(approx_eq(state.qubit_probability(0).unwrap(), 1.0, 1e-10));
}
