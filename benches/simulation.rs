// benches/simulation.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qsim::quantum::fourier;
use qsim::quantum::{Gate, QuantumState};
use qsim::simulators::{CancellationToken, ExperimentRunner};

fn benchmark_gate_application(c: &mut Criterion) {
    c.bench_function("hadamard_16_qubits", |b| {
        let mut state = QuantumState::new(16).unwrap();
        let gate = Gate::hadamard(7);

        b.iter(|| {
            state.apply_gate(black_box(&gate)).unwrap();
        });
    });

    c.bench_function("qft_10_qubits", |b| {
        b.iter(|| fourier::apply_qft(black_box(10)).unwrap());
    });
}

fn benchmark_experiments(c: &mut Criterion) {
    let circuit = fourier::qft_circuit(8).unwrap();
    let runner = ExperimentRunner::new(4, Some(1)).unwrap();
    let token = CancellationToken::new();

    c.bench_function("qft_8_qubits_x64_experiments", |b| {
        b.iter(|| runner.run_repeated(black_box(&circuit), 64, &token).unwrap());
    });
}

criterion_group!(benches, benchmark_gate_application, benchmark_experiments);
criterion_main!(benches);
