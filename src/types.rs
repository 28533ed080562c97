//! Common scalar types and the public solve() contract.

use serde::{Deserialize, Serialize};

/// Dense item index in `[0, numItems)`.
pub type ItemId = usize;

/// Dense order index in `[0, numOrders)`.
pub type OrderId = usize;

/// Dense aisle index in `[0, numAisles)`.
pub type AisleId = usize;

/// Item quantity (always strictly positive once ingested).
pub type Quantity = u64;

/// Explicit, value-based solver configuration. No hidden globals: every
/// knob the solver reads comes from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dinkelbach convergence tolerance.
    pub epsilon: f64,
    /// Outer Dinkelbach loop cap.
    pub max_iterations: u32,
    /// Number of VNS shake levels (k = 1..=max_neighborhoods).
    pub max_neighborhoods: u8,
    /// VNS outer stop: consecutive non-improving shake rounds.
    pub max_no_improve: u8,
    /// Parallel fan-out worker count (clamped to `[1, 8]`).
    pub worker_count: u8,
    /// RNG seed for deterministic reproducibility.
    pub seed: u64,
    /// Enable the per-item supply check in the feasibility oracle (C4).
    pub validate_stock: bool,
    /// Fraction of the time budget after which VNS is disabled (C7-only).
    pub time_budget_soft_fraction: f64,
    /// Fraction of the time budget after which the loop aborts.
    pub time_budget_hard_fraction: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            max_iterations: 100,
            max_neighborhoods: 3,
            max_no_improve: 5,
            worker_count: default_worker_count(),
            seed: 0,
            validate_stock: true,
            time_budget_soft_fraction: 0.8,
            time_budget_hard_fraction: 0.95,
        }
    }
}

fn default_worker_count() -> u8 {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8) as u8
}

impl Config {
    /// Worker count clamped to `[1, 8]`, never zero.
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count.clamp(1, 8) as usize
    }
}

/// Outcome of [`crate::solve`]. Tagged by how the Dinkelbach loop ended.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    /// Converged (or exhausted `maxIterations`) with a feasible solution.
    Ok {
        /// The best solution found
        solution: crate::solution::SolutionSummary,
        /// Its ratio (picked units / visited aisles)
        ratio: f64,
    },
    /// The wall-clock budget was exhausted before convergence; best-so-far
    /// is still a usable, fully-consistent solution.
    TimedOut {
        /// The best solution found before the deadline
        best_solution: crate::solution::SolutionSummary,
        /// Its ratio
        ratio: f64,
    },
    /// No subset of orders/aisles satisfying LB was ever found.
    NoFeasibleSolution {
        /// The best partial (possibly below-LB) solution observed
        partial_best: crate::solution::SolutionSummary,
    },
    /// The instance itself violates a structural invariant.
    InvalidInstance {
        /// Human-readable reason
        reason: String,
    },
}

/// Statistics describing one `solve()` run, surfaced for observability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverStats {
    /// Wall-clock time spent solving, in seconds.
    pub solve_time_seconds: f64,
    /// Dinkelbach outer iterations completed.
    pub iterations: u32,
    /// Whether the loop reported numerical convergence (`|newRatio - λ| <
    /// epsilon`), as opposed to stopping on the iteration cap or deadline.
    pub converged: bool,
    /// Best ratio observed.
    pub best_ratio: f64,
}
