//! # wave-picking-solver
//!
//! A fractional-objective wave-picking optimizer for warehouse order
//! fulfillment: given orders (item demands) and aisles (item stock),
//! select a subset of orders and a covering set of aisles that keeps
//! total picked units within `[LB, UB]` and maximizes
//! `picked units / visited aisles`.
//!
//! ## Modules
//!
//! - [`instance`] - immutable problem data (C1)
//! - [`index`] - precomputed dense indices over an instance (C2)
//! - [`cover`] - near-minimal aisle selection for a demand vector (C3)
//! - [`feasibility`] - cheap solution validity checks (C4)
//! - [`construct`] - three-stage fallback initial solution (C5)
//! - [`parametric`] - Dinkelbach surrogate-objective subsolver (C6)
//! - [`local_search`] - add/remove/swap best-improvement search (C7)
//! - [`vns`] - Variable Neighborhood Search driver (C8)
//! - [`dinkelbach`] - the outer parametric loop (C9)
//! - [`solution`] - the mutable working solution object
//!
//! ## Quick Start
//!
//! ```rust
//! use wave_picking_solver::{solve, Config, Instance, SolveOutcome};
//! use std::time::{Duration, Instant};
//!
//! let instance = Instance::new(
//!     1, 1, 1, 1, 10,
//!     vec![vec![(0, 3)]],
//!     vec![vec![(0, 5)]],
//! ).unwrap();
//!
//! let outcome = solve(&instance, &Config::default(), Instant::now() + Duration::from_secs(5));
//! match outcome {
//!     SolveOutcome::Ok { solution, ratio } => {
//!         println!("picked {} units across {} aisles (ratio {ratio})",
//!             solution.total_units, solution.visited_aisles.len());
//!     }
//!     other => println!("{other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod construct;
pub mod cover;
pub mod dinkelbach;
pub mod feasibility;
pub mod index;
pub mod instance;
pub mod local_search;
pub mod parametric;
pub mod rng;
pub mod solution;
pub mod vns;

mod error;
mod types;

pub use error::{Error, Result};
pub use instance::Instance;
pub use solution::{Solution, SolutionSummary};
pub use types::*;

use std::time::Instant;

/// Solve a wave-picking instance: select orders and a covering aisle set
/// maximizing `picked units / visited aisles` subject to `[LB, UB]` and
/// per-item stock. Deterministic modulo `config.seed`; never panics on a
/// well-formed [`Instance`] and never exceeds `deadline`.
#[tracing::instrument(skip_all)]
pub fn solve(instance: &Instance, config: &Config, deadline: Instant) -> SolveOutcome {
    let (outcome, stats) = dinkelbach::run(instance, config, deadline);
    tracing::info!(
        iterations = stats.iterations,
        converged = stats.converged,
        best_ratio = stats.best_ratio,
        solve_time_seconds = stats.solve_time_seconds,
        "solve finished"
    );
    outcome
}

/// Prelude for common imports.
pub mod prelude {
    pub use crate::instance::Instance;
    pub use crate::solution::{Solution, SolutionSummary};
    pub use crate::types::{Config, SolveOutcome, SolverStats};
    pub use crate::{solve, Error, Result};
}
