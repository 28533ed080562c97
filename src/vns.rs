//! VNS Driver (C8): perturb-and-improve across escalating neighborhood
//! sizes to escape C7 local optima.

use crate::feasibility;
use crate::index::IndexBundle;
use crate::instance::Instance;
use crate::local_search;
use crate::rng::worker_rng;
use crate::solution::Solution;
use crate::types::OrderId;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Shake `solution` at level `k` (1, 2, or 3 per spec.md §4.7) using the
/// given RNG, then run C7 local search on the shaken copy.
fn shake_and_improve(
    instance: &Instance,
    index: &IndexBundle,
    solution: &Solution,
    lambda: f64,
    k: u8,
    validate_stock: bool,
    rng: &mut impl Rng,
) -> crate::error::Result<Solution> {
    let mut shaken = solution.clone();
    shake(instance, index, &mut shaken, k, rng)?;
    local_search::improve(instance, index, &mut shaken, lambda, validate_stock)?;
    Ok(shaken)
}

fn shake(
    instance: &Instance,
    index: &IndexBundle,
    solution: &mut Solution,
    k: u8,
    rng: &mut impl Rng,
) -> crate::error::Result<()> {
    let selected: Vec<OrderId> = solution.selected_orders().iter().copied().collect();
    if selected.is_empty() {
        return Ok(());
    }
    let unselected: Vec<OrderId> = (0..instance.num_orders())
        .filter(|o| !solution.selected_orders().contains(o))
        .collect();
    if unselected.is_empty() {
        return Ok(());
    }

    match k {
        1 => {
            // swap one random order
            let remove = *selected.choose(rng).expect("selected is non-empty");
            let add = *unselected.choose(rng).expect("unselected is non-empty");
            try_apply_swap(instance, index, solution, remove, add)?;
        }
        2 => {
            // swap up to floor(|S|/2) orders, capped at 3
            let count = (selected.len() / 2).min(3).max(1);
            let mut removes: Vec<OrderId> = selected.clone();
            removes.shuffle(rng);
            removes.truncate(count);
            let mut adds: Vec<OrderId> = unselected.clone();
            adds.shuffle(rng);
            adds.truncate(count);
            for (remove, add) in removes.into_iter().zip(adds) {
                let _ = try_apply_swap(instance, index, solution, remove, add);
            }
        }
        _ => {
            // remove up to 5 orders then add up to 5 fresh orders
            let selected_now: Vec<OrderId> = solution.selected_orders().iter().copied().collect();
            // never remove every selected order — keep at least one so
            // the addition phase below has a nonempty base to extend
            let remove_count = 5.min(selected_now.len().saturating_sub(1));
            let mut to_remove = selected_now.clone();
            to_remove.shuffle(rng);
            to_remove.truncate(remove_count);
            for o in to_remove {
                let _ = solution.remove_order(o, instance, index);
            }

            let mut candidates: Vec<OrderId> = (0..instance.num_orders())
                .filter(|o| !solution.selected_orders().contains(o))
                .collect();
            candidates.shuffle(rng);
            candidates.truncate(5);
            for o in candidates {
                if solution.total_units() + index.total_units[o] <= instance.ub() {
                    let _ = solution.add_order(o, instance, index);
                }
            }
        }
    }
    Ok(())
}

fn try_apply_swap(
    instance: &Instance,
    index: &IndexBundle,
    solution: &mut Solution,
    remove: OrderId,
    add: OrderId,
) -> crate::error::Result<bool> {
    if !solution.selected_orders().contains(&remove) || solution.selected_orders().contains(&add) {
        return Ok(false);
    }
    let before = solution.clone();
    // NoCover is reachable and non-fatal here too (spec.md §7): a shake
    // step that cannot be covered is simply discarded, not propagated.
    if solution.remove_order(remove, instance, index).is_err()
        || solution.add_order(add, instance, index).is_err()
    {
        *solution = before;
        return Ok(false);
    }
    if solution.total_units() > instance.ub() {
        *solution = before;
        return Ok(false);
    }
    Ok(true)
}

/// Escape local optima by shaking at escalating levels `k = 1..=max_k`,
/// re-running C7 after each shake, and resetting to `k = 1` on any
/// strict improvement. Stops after `max_no_improve` consecutive
/// non-improving outer rounds.
///
/// K3 diversification: at each shake level, `worker_count` independent
/// shaken copies are produced (each from an RNG derived from
/// `(seed, worker_index)`), improved in parallel, and the best result is
/// kept — workers are value-owned, sharing only the read-only `instance`
/// and `index`.
#[tracing::instrument(skip_all, fields(lambda = lambda))]
pub fn run(
    instance: &Instance,
    index: &IndexBundle,
    solution: &mut Solution,
    lambda: f64,
    max_neighborhoods: u8,
    max_no_improve: u8,
    seed: u64,
    worker_count: usize,
    validate_stock: bool,
) -> crate::error::Result<()> {
    let mut no_improve_rounds: u8 = 0;
    let mut k: u8 = 1;
    let objective_of = |s: &Solution| -> f64 {
        s.selected_orders()
            .iter()
            .map(|&o| crate::parametric::parametric_value(index, o, lambda))
            .sum()
    };

    while no_improve_rounds < max_no_improve {
        let current_obj = objective_of(solution);

        let candidates: Vec<Option<Solution>> = (0..worker_count.max(1))
            .into_par_iter()
            .map(|w| {
                let mut rng = worker_rng(seed.wrapping_add(k as u64), w);
                shake_and_improve(instance, index, solution, lambda, k, validate_stock, &mut rng).ok()
            })
            .collect();

        let best = candidates
            .into_iter()
            .flatten()
            .filter(|s| feasibility::check(s, instance, validate_stock).is_feasible())
            .max_by(|a, b| {
                objective_of(a)
                    .partial_cmp(&objective_of(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        match best {
            Some(candidate) if objective_of(&candidate) > current_obj => {
                *solution = candidate;
                k = 1;
                no_improve_rounds = 0;
            }
            _ => {
                no_improve_rounds += 1;
                k = if k >= max_neighborhoods.max(1) { 1 } else { k + 1 };
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;

    #[test]
    fn vns_never_worsens_the_solution() {
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
        let idx = IndexBundle::build(&inst, 1).unwrap();
        let mut sol = Solution::empty();
        sol.add_order(0, &inst, &idx).unwrap();
        sol.add_order(2, &inst, &idx).unwrap();
        let before_ratio = sol.ratio();
        run(&inst, &idx, &mut sol, 0.0, 3, 2, 1, 2, true).unwrap();
        assert!(sol.ratio() >= before_ratio - 1e-9);
    }
}
