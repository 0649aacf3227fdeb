//! Fork-join simulation drivers
//!
//! Two strategies are provided:
//!
//! * [`BatchSimulator`] splits one gate sequence into contiguous batches and
//!   applies them concurrently to a single shared state. This is only sound
//!   when the batches act on disjoint qubits, so the plan is checked first
//!   and dependent plans are applied sequentially instead.
//! * [`ExperimentRunner`] runs many independent circuits at once. Each
//!   experiment owns its state and RNG; the only lock guards the shared
//!   result list.
//!
//! Both drivers block until every worker has finished and check a
//! [`CancellationToken`] at each batch or experiment boundary.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{info, warn};

use super::statevector::seeded_rng;
use crate::config::SimulatorConfig;
use crate::error::{QuantumError, Result};
use crate::quantum::circuit::QuantumCircuit;
use crate::quantum::gate::Gate;
use crate::quantum::state::{QuantumState, MAX_QUBITS};

/// Cooperative cancellation shared between a caller and running workers
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that running simulations stop at the next boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(QuantumError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn build_pool(threads: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| QuantumError::ThreadPool(e.to_string()))
}

/// A gate sequence split into contiguous batches
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    batches: Vec<Vec<Gate>>,
}

impl BatchPlan {
    /// Split `gates` into batches of `ceil(len / max_parallelism)` gates
    pub fn new(gates: &[Gate], max_parallelism: usize) -> Self {
        let parallelism = max_parallelism.max(1);
        let batch_size = ((gates.len() + parallelism - 1) / parallelism).max(1);

        BatchPlan {
            batches: gates.chunks(batch_size).map(<[Gate]>::to_vec).collect(),
        }
    }

    pub fn batches(&self) -> &[Vec<Gate>] {
        &self.batches
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Whether no two batches touch a common qubit
    ///
    /// Gates on disjoint qubits commute, so independent batches give the
    /// same final state in any interleaving.
    pub fn is_independent(&self) -> bool {
        let mut seen = BTreeSet::new();

        for batch in &self.batches {
            let touched: BTreeSet<usize> = batch
                .iter()
                .flat_map(|gate| gate.qubits().iter().copied())
                .collect();

            if !seen.is_disjoint(&touched) {
                return false;
            }
            seen.extend(touched);
        }

        true
    }
}

/// Applies gate batches concurrently to one shared state
pub struct BatchSimulator {
    max_parallelism: usize,
    max_qubits: usize,
    pool: ThreadPool,
}

impl BatchSimulator {
    pub fn new(max_parallelism: usize) -> Result<Self> {
        if max_parallelism == 0 {
            return Err(QuantumError::Config(
                "max_parallelism must be at least 1".to_string(),
            ));
        }

        Ok(BatchSimulator {
            max_parallelism,
            max_qubits: MAX_QUBITS,
            pool: build_pool(max_parallelism)?,
        })
    }

    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;

        Ok(BatchSimulator {
            max_parallelism: config.max_parallelism,
            max_qubits: config.max_qubits,
            pool: build_pool(config.max_parallelism)?,
        })
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    pub fn plan(&self, gates: &[Gate]) -> BatchPlan {
        BatchPlan::new(gates, self.max_parallelism)
    }

    /// Apply `gates` to `state`, running independent batches concurrently
    ///
    /// Every gate is validated before any is applied. Gates within a batch
    /// keep their order; each application holds the state lock.
    pub fn run(&self, state: &Mutex<QuantumState>, gates: &[Gate], token: &CancellationToken) -> Result<()> {
        let qubit_count = lock(state).qubit_count();
        for gate in gates {
            gate.validate(qubit_count)?;
        }

        let plan = self.plan(gates);

        if !plan.is_independent() {
            warn!(
                batches = plan.batch_count(),
                "gate batches share qubits; applying sequentially"
            );
            for batch in plan.batches() {
                token.check()?;
                apply_batch(state, batch)?;
            }
            return Ok(());
        }

        info!(
            batches = plan.batch_count(),
            gates = gates.len(),
            "applying independent batches in parallel"
        );

        self.pool.install(|| {
            plan.batches().par_iter().try_for_each(|batch| {
                token.check()?;
                apply_batch(state, batch)
            })
        })
    }

    /// Execute `circuit` from |0...0⟩ using batch splitting
    pub fn run_circuit(&self, circuit: &QuantumCircuit, token: &CancellationToken) -> Result<QuantumState> {
        let state = Mutex::new(QuantumState::with_limit(circuit.qubit_count(), self.max_qubits)?);
        self.run(&state, circuit.gates(), token)?;
        Ok(state.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

fn apply_batch(state: &Mutex<QuantumState>, batch: &[Gate]) -> Result<()> {
    for gate in batch {
        lock(state).apply_gate(gate)?;
    }
    Ok(())
}

/// The outcome of one experiment
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentResult {
    /// Position of the experiment in the submitted list
    pub index: usize,
    /// Final state, collapsed by the measurement
    pub state: QuantumState,
    /// Measured basis state
    pub outcome: usize,
}

/// Runs independent circuits concurrently, each on its own state
pub struct ExperimentRunner {
    pool: ThreadPool,
    seed: Option<u64>,
    max_qubits: usize,
}

impl ExperimentRunner {
    pub fn new(max_parallelism: usize, seed: Option<u64>) -> Result<Self> {
        if max_parallelism == 0 {
            return Err(QuantumError::Config(
                "max_parallelism must be at least 1".to_string(),
            ));
        }

        Ok(ExperimentRunner {
            pool: build_pool(max_parallelism)?,
            seed,
            max_qubits: MAX_QUBITS,
        })
    }

    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;

        Ok(ExperimentRunner {
            pool: build_pool(config.max_parallelism)?,
            seed: config.seed,
            max_qubits: config.max_qubits,
        })
    }

    /// Execute and measure every circuit; results are in input order
    ///
    /// With a seed, experiment `i` measures with seed `seed + i`, so results
    /// do not depend on scheduling.
    pub fn run(&self, experiments: &[QuantumCircuit], token: &CancellationToken) -> Result<Vec<ExperimentResult>> {
        self.run_indexed(experiments.len(), |i| &experiments[i], token)
    }

    /// Execute and measure the same circuit `repetitions` times
    pub fn run_repeated(
        &self,
        circuit: &QuantumCircuit,
        repetitions: usize,
        token: &CancellationToken,
    ) -> Result<Vec<ExperimentResult>> {
        self.run_indexed(repetitions, |_| circuit, token)
    }

    fn run_indexed<'a, F>(&self, count: usize, circuit_at: F, token: &CancellationToken) -> Result<Vec<ExperimentResult>>
    where
        F: Sync + Fn(usize) -> &'a QuantumCircuit,
    {
        info!(experiments = count, "running experiments");
        let results = Mutex::new(Vec::with_capacity(count));

        self.pool.install(|| {
            (0..count).into_par_iter().try_for_each(|index| {
                token.check()?;

                let mut state = circuit_at(index).execute_with_limit(self.max_qubits)?;
                let mut rng = seeded_rng(self.seed.map(|seed| seed.wrapping_add(index as u64)));
                let outcome = state.measure_with(&mut rng)?;

                lock(&results).push(ExperimentResult { index, state, outcome });
                Ok::<(), QuantumError>(())
            })
        })?;

        let mut results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
        results.sort_by_key(|result| result.index);
        Ok(results)
    }
}

/// How often each basis state was observed across `results`
pub fn outcome_counts(results: &[ExperimentResult]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for result in results {
        *counts.entry(result.outcome).or_insert(0) += 1;
    }
    counts
}
