//! Dinkelbach Loop (C9): iterate λ ← ratio(best) until convergence,
//! calling C6/C7/C8 at each step, respecting a wall-clock budget.

use crate::construct;
use crate::feasibility;
use crate::index::IndexBundle;
use crate::instance::Instance;
use crate::local_search;
use crate::parametric;
use crate::solution::Solution;
use crate::types::{Config, SolveOutcome, SolverStats};
use crate::vns;
use std::time::Instant;

/// States the loop moves through; `TimedOut` is reachable from
/// `Iterating` or `Polishing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initializing,
    Constructing,
    Iterating,
    Polishing,
    Done,
    TimedOut,
}

/// Run the full Dinkelbach loop and return the tagged [`SolveOutcome`].
#[tracing::instrument(skip_all)]
pub fn run(instance: &Instance, config: &Config, deadline: Instant) -> (SolveOutcome, SolverStats) {
    let start = Instant::now();
    let mut state = State::Initializing;
    let worker_count = config.effective_worker_count();

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            return (
                SolveOutcome::InvalidInstance {
                    reason: format!("failed to build worker pool: {e}"),
                },
                SolverStats::default(),
            )
        }
    };

    pool.install(|| run_inner(instance, config, deadline, start, &mut state))
}

fn run_inner(
    instance: &Instance,
    config: &Config,
    deadline: Instant,
    start: Instant,
    state: &mut State,
) -> (SolveOutcome, SolverStats) {
    let worker_count = config.effective_worker_count();

    *state = State::Constructing;
    let index = match IndexBundle::build(instance, worker_count) {
        Ok(idx) => idx,
        Err(e) => {
            return (
                SolveOutcome::InvalidInstance { reason: e.to_string() },
                SolverStats::default(),
            )
        }
    };

    let construct_result = match construct::build(instance, &index, worker_count) {
        Ok(r) => r,
        Err(e) => {
            return (
                SolveOutcome::InvalidInstance { reason: e.to_string() },
                SolverStats::default(),
            )
        }
    };

    if construct_result.below_lower_bound {
        tracing::warn!("constructive builder could not reach LB; reporting NoFeasibleSolution");
        return (
            SolveOutcome::NoFeasibleSolution {
                partial_best: construct_result.solution.summary(),
            },
            SolverStats {
                solve_time_seconds: start.elapsed().as_secs_f64(),
                iterations: 0,
                converged: false,
                best_ratio: construct_result.solution.ratio(),
            },
        );
    }

    let mut best = construct_result.solution;
    let mut lambda = best.ratio();
    let mut iterations: u32 = 0;
    let mut converged = false;

    *state = State::Iterating;
    let mut vns_disabled = false;

    for _ in 0..config.max_iterations {
        iterations += 1;

        let elapsed_fraction = elapsed_fraction(start, deadline);
        if elapsed_fraction > config.time_budget_hard_fraction {
            *state = State::TimedOut;
            break;
        }
        if elapsed_fraction > config.time_budget_soft_fraction {
            vns_disabled = true;
        }

        let mut candidate = match parametric::subsolve(instance, &index, lambda, worker_count) {
            Ok(c) => c,
            Err(_) => continue,
        };

        let refine_result = if vns_disabled {
            local_search::improve(instance, &index, &mut candidate, lambda, config.validate_stock)
        } else {
            vns::run(
                instance,
                &index,
                &mut candidate,
                lambda,
                config.max_neighborhoods,
                config.max_no_improve,
                config.seed,
                worker_count,
                config.validate_stock,
            )
        };
        if refine_result.is_err() {
            continue;
        }

        if !feasibility::check(&candidate, instance, config.validate_stock).is_feasible() {
            continue;
        }

        let new_ratio = candidate.ratio();

        if (new_ratio - lambda).abs() < config.epsilon {
            converged = true;
            if new_ratio > best.ratio() {
                debug_assert!(new_ratio >= best.ratio() - 1e-9, "P4: best ratio must not decrease");
                best = candidate;
            }
            break;
        }

        if new_ratio > best.ratio() {
            debug_assert!(new_ratio >= best.ratio() - 1e-9, "P4: best ratio must not decrease");
            best = candidate;
        }
        lambda = new_ratio;
    }

    *state = State::Polishing;
    let mut polished = best.clone();
    if local_search::improve(instance, &index, &mut polished, lambda, config.validate_stock).is_ok()
        && feasibility::check(&polished, instance, config.validate_stock).is_feasible()
        && polished.ratio() >= best.ratio()
    {
        best = polished;
    }

    let stats = SolverStats {
        solve_time_seconds: start.elapsed().as_secs_f64(),
        iterations,
        converged,
        best_ratio: best.ratio(),
    };

    let outcome = if *state == State::TimedOut {
        SolveOutcome::TimedOut {
            best_solution: best.summary(),
            ratio: best.ratio(),
        }
    } else {
        *state = State::Done;
        SolveOutcome::Ok {
            solution: best.summary(),
            ratio: best.ratio(),
        }
    };

    (outcome, stats)
}

fn elapsed_fraction(start: Instant, deadline: Instant) -> f64 {
    let total = deadline.saturating_duration_since(start).as_secs_f64();
    if total <= 0.0 {
        return 1.0;
    }
    let elapsed = start.elapsed().as_secs_f64();
    elapsed / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn trivial_scenario_s1() {
        let inst = Instance::new(1, 1, 1, 1, 10, vec![vec![(0, 3)]], vec![vec![(0, 5)]]).unwrap();
        let config = Config {
            worker_count: 1,
            ..Config::default()
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        let (outcome, _) = run(&inst, &config, deadline);
        match outcome {
            SolveOutcome::Ok { solution, ratio } => {
                assert_eq!(solution.selected_orders, vec![0]);
                assert_eq!(solution.visited_aisles, vec![0]);
                assert!((ratio - 3.0).abs() < 1e-6);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn infeasible_lb_scenario_s4() {
        let inst = Instance::new(1, 1, 1, 5, 10, vec![vec![(0, 2)]], vec![vec![(0, 2)]]).unwrap();
        let config = Config {
            worker_count: 1,
            ..Config::default()
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        let (outcome, _) = run(&inst, &config, deadline);
        assert!(matches!(outcome, SolveOutcome::NoFeasibleSolution { .. }));
    }

    #[test]
    fn forced_swap_scenario_s2() {
        let inst = Instance::new(
            2,
            2,
            2,
            5,
            5,
            vec![vec![(0, 5)], vec![(1, 5)]],
            vec![vec![(0, 5)], vec![(1, 5)]],
        )
        .unwrap();
        let config = Config {
            worker_count: 1,
            ..Config::default()
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        let (outcome, _) = run(&inst, &config, deadline);
        match outcome {
            SolveOutcome::Ok { solution, ratio } => {
                assert_eq!(solution.selected_orders.len(), 1);
                assert_eq!(solution.visited_aisles.len(), 1);
                assert_relative_eq!(ratio, 5.0, epsilon = 1e-6);
                assert_p1_p3(&inst, &solution);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn efficiency_wins_scenario_s3() {
        let inst = Instance::new(
            3,
            3,
            3,
            10,
            12,
            vec![vec![(0, 10)], vec![(1, 1), (2, 1)], vec![(0, 2)]],
            vec![vec![(0, 12)], vec![(1, 5)], vec![(2, 5)]],
        )
        .unwrap();
        let config = Config {
            worker_count: 1,
            ..Config::default()
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        let (outcome, _) = run(&inst, &config, deadline);
        match outcome {
            SolveOutcome::Ok { solution, ratio } => {
                assert_eq!(solution.selected_orders, vec![0, 2]);
                assert_eq!(solution.visited_aisles, vec![0]);
                assert_eq!(solution.total_units, 12);
                assert!((ratio - 12.0).abs() < 1e-6);
                assert_p1_p3(&inst, &solution);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn upper_bound_clamp_scenario_s5() {
        let inst = Instance::new(
            3,
            3,
            3,
            10,
            15,
            vec![vec![(0, 10)], vec![(1, 10)], vec![(2, 10)]],
            vec![vec![(0, 10)], vec![(1, 10)], vec![(2, 10)]],
        )
        .unwrap();
        let config = Config {
            worker_count: 1,
            ..Config::default()
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        let (outcome, _) = run(&inst, &config, deadline);
        match outcome {
            SolveOutcome::Ok { solution, ratio } => {
                assert_eq!(solution.selected_orders.len(), 1);
                assert_eq!(solution.visited_aisles.len(), 1);
                assert!((ratio - 10.0).abs() < 1e-6);
                assert_p1_p3(&inst, &solution);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn timeout_scenario_s6_returns_feasible_best() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let num_orders = 500;
        let num_items = 1000;
        let num_aisles = 200;
        let mut rng = StdRng::seed_from_u64(99);

        let orders: Vec<Vec<(usize, u64)>> = (0..num_orders)
            .map(|_| {
                let k = rng.gen_range(1..6);
                (0..k)
                    .map(|_| (rng.gen_range(0..num_items), rng.gen_range(1..20)))
                    .collect()
            })
            .collect();
        let aisles: Vec<Vec<(usize, u64)>> = (0..num_aisles)
            .map(|_| {
                let k = rng.gen_range(1..10);
                (0..k)
                    .map(|_| (rng.gen_range(0..num_items), rng.gen_range(10..200)))
                    .collect()
            })
            .collect();

        let inst = Instance::new(num_items, num_orders, num_aisles, 50, 2000, orders, aisles).unwrap();
        let config = Config::default();
        let deadline = Instant::now() + Duration::from_millis(50);
        let (outcome, _) = run(&inst, &config, deadline);

        match outcome {
            SolveOutcome::TimedOut { best_solution, .. } => assert_p1_p3(&inst, &best_solution),
            SolveOutcome::Ok { solution, .. } => assert_p1_p3(&inst, &solution),
            other => panic!("expected TimedOut or Ok on a large instance, got {other:?}"),
        }
    }

    #[test]
    fn p2_bound_containment_holds_on_ok() {
        let inst = Instance::new(
            3,
            3,
            3,
            10,
            12,
            vec![vec![(0, 10)], vec![(1, 1), (2, 1)], vec![(0, 2)]],
            vec![vec![(0, 12)], vec![(1, 5)], vec![(2, 5)]],
        )
        .unwrap();
        let config = Config {
            worker_count: 1,
            ..Config::default()
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        let (outcome, _) = run(&inst, &config, deadline);
        if let SolveOutcome::Ok { solution, .. } = outcome {
            assert!(solution.total_units >= inst.lb());
            assert!(solution.total_units <= inst.ub());
        } else {
            panic!("expected Ok");
        }
    }

    #[test]
    fn p5_deterministic_across_worker_counts() {
        let inst = Instance::new(
            3,
            3,
            3,
            10,
            12,
            vec![vec![(0, 10)], vec![(1, 1), (2, 1)], vec![(0, 2)]],
            vec![vec![(0, 12)], vec![(1, 5)], vec![(2, 5)]],
        )
        .unwrap();

        let config1 = Config {
            worker_count: 1,
            ..Config::default()
        };
        let config4 = Config {
            worker_count: 4,
            ..Config::default()
        };

        let (r1, _) = run(&inst, &config1, Instant::now() + Duration::from_secs(2));
        let (r4, _) = run(&inst, &config4, Instant::now() + Duration::from_secs(2));

        match (r1, r4) {
            (SolveOutcome::Ok { solution: s1, ratio: ra }, SolveOutcome::Ok { solution: s4, ratio: rb }) => {
                assert_eq!(s1.selected_orders, s4.selected_orders);
                assert_eq!(s1.visited_aisles, s4.visited_aisles);
                assert!((ra - rb).abs() < 1e-9);
            }
            other => panic!("expected both to be Ok, got {other:?}"),
        }
    }

    /// P1 (stock coverage) and P3 (ID validity/uniqueness) over a
    /// [`crate::solution::SolutionSummary`] produced by [`run`].
    fn assert_p1_p3(instance: &Instance, solution: &crate::solution::SolutionSummary) {
        use std::collections::HashSet;

        let order_set: HashSet<_> = solution.selected_orders.iter().copied().collect();
        assert_eq!(order_set.len(), solution.selected_orders.len());
        for &o in &solution.selected_orders {
            assert!(o < instance.num_orders());
        }
        let aisle_set: HashSet<_> = solution.visited_aisles.iter().copied().collect();
        assert_eq!(aisle_set.len(), solution.visited_aisles.len());
        for &a in &solution.visited_aisles {
            assert!(a < instance.num_aisles());
        }

        let mut demand = vec![0u64; instance.num_items()];
        for &o in &solution.selected_orders {
            for (item, qty) in instance.order_demand(o).iter() {
                demand[item] += qty;
            }
        }
        let mut supply = vec![0u64; instance.num_items()];
        for &a in &solution.visited_aisles {
            for (item, qty) in instance.aisle_stock(a).iter() {
                supply[item] += qty;
            }
        }
        for (need, have) in demand.iter().zip(supply.iter()) {
            assert!(need <= have);
        }
    }
}
