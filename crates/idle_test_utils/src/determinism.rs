//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs and an identical random stream.
//!
//! # Testing Strategy
//!
//! The game is not required to be bit-reproducible between play sessions,
//! but for a fixed random stream every resolution order and every modifier
//! fold must come out the same. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   All keyed state lives in `BTreeMap`/`BTreeSet`.
//!
//! - **Ambient randomness**: No roll may bypass the injected
//!   [`RandomSource`](idle_core::rng::RandomSource).
//!
//! - **Wall-clock reads**: The engine only sees timestamps passed in.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual module determinism (missions, spawns, ...)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full simulation scenarios are reproducible
//! 4. **Parallel tests**: Running N simulations on threads all match

use std::thread;

use idle_core::simulation::Simulation;

use crate::fixtures::{self, TICK_MS};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, ticks: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            ticks,
        }
    }

    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    DeterminismResult::from_hashes(hashes, ticks)
}

/// Advance `sim` by one live tick after its last known timestamp.
pub fn step(sim: &mut Simulation) {
    let now = sim.state().last_known_timestamp + TICK_MS;
    sim.tick(now);
}

/// Run the automated economy fixture `runs` times on `seed` and compare
/// final hashes.
///
/// # Example
///
/// ```
/// use idle_test_utils::determinism::verify_seeded;
///
/// verify_seeded(42, 200, 3).assert_deterministic();
/// ```
#[must_use]
pub fn verify_seeded(seed: u64, ticks: u64, runs: usize) -> DeterminismResult {
    let result = verify_determinism(
        runs,
        ticks,
        || fixtures::automated_economy(seed),
        step,
        Simulation::state_hash,
    );
    tracing::debug!(
        seed,
        ticks,
        runs,
        deterministic = result.is_deterministic,
        "Determinism check"
    );
    result
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel<F>(setup: F, runs: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup();
                    for _ in 0..ticks {
                        step(&mut sim);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult::from_hashes(hashes, ticks)
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup();
    let mut sim2 = setup();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=ticks {
        step(&mut sim1);
        step(&mut sim2);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a checkpoint round-trip preserves the state hash exactly.
pub fn verify_checkpoint_roundtrip<F>(setup: F, ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup();
    for _ in 0..ticks {
        step(&mut sim);
    }
    let hash_before = sim.state_hash();

    let Ok(bytes) = sim.checkpoint() else {
        return false;
    };
    let mut restored = setup();
    if restored.rollback(&bytes).is_err() {
        return false;
    }

    hash_before == restored.state_hash()
}

/// Verify that a JSON save round-trip preserves the state exactly.
pub fn verify_json_roundtrip<F>(setup: F, ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup();
    for _ in 0..ticks {
        step(&mut sim);
    }
    let Ok(json) = sim.export_json() else {
        return false;
    };
    let mut restored = setup();
    let now = sim.state().last_known_timestamp;
    if restored.import_json(&json, now).is_err() {
        return false;
    }
    sim.state() == restored.state()
}
