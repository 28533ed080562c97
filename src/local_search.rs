//! Local Search (C7): best-improvement add / remove / swap neighborhoods
//! over the parametric objective.

use crate::feasibility::{self, Feasibility};
use crate::index::IndexBundle;
use crate::instance::Instance;
use crate::parametric::parametric_value;
use crate::solution::Solution;
use crate::types::OrderId;

/// Total parametric objective of a solution's selected orders at `lambda`.
fn objective(index: &IndexBundle, solution: &Solution, lambda: f64) -> f64 {
    solution
        .selected_orders()
        .iter()
        .map(|&o| parametric_value(index, o, lambda))
        .sum()
}

/// Run best-improvement passes (add, then remove, then swap, in that
/// order on each pass) until no neighborhood improves the parametric
/// objective. Every accepted move recomputes the aisle cover (C3) and
/// re-checks feasibility (C4); infeasible moves are rolled back.
#[tracing::instrument(skip_all, fields(lambda = lambda))]
pub fn improve(
    instance: &Instance,
    index: &IndexBundle,
    solution: &mut Solution,
    lambda: f64,
    validate_stock: bool,
) -> crate::error::Result<()> {
    loop {
        let mut improved = false;
        improved |= try_add(instance, index, solution, lambda, validate_stock)?;
        improved |= try_remove(instance, index, solution, lambda, validate_stock)?;
        improved |= try_swap(instance, index, solution, lambda, validate_stock)?;
        if !improved {
            break;
        }
    }
    Ok(())
}

fn try_add(
    instance: &Instance,
    index: &IndexBundle,
    solution: &mut Solution,
    lambda: f64,
    validate_stock: bool,
) -> crate::error::Result<bool> {
    let current_obj = objective(index, solution, lambda);
    let mut best: Option<(OrderId, f64)> = None;

    for o in 0..instance.num_orders() {
        if solution.selected_orders().contains(&o) {
            continue;
        }
        let v = parametric_value(index, o, lambda);
        if v <= 0.0 {
            continue;
        }
        if solution.total_units() + index.total_units[o] > instance.ub() {
            continue;
        }
        let candidate_obj = current_obj + v;
        if best.map_or(true, |(_, best_obj)| candidate_obj > best_obj) {
            best = Some((o, candidate_obj));
        }
    }

    let Some((order, _)) = best else {
        return Ok(false);
    };

    let before = solution.clone();
    // NoCover is a reachable, non-fatal condition (spec.md §7): a move
    // that cannot be covered is discarded here and the search continues,
    // it must never escape to the caller and abort the whole pass.
    if solution.add_order(order, instance, index).is_err() {
        *solution = before;
        return Ok(false);
    }
    if !feasibility::check(solution, instance, validate_stock).is_feasible() {
        *solution = before;
        return Ok(false);
    }
    Ok(true)
}

fn try_remove(
    instance: &Instance,
    index: &IndexBundle,
    solution: &mut Solution,
    lambda: f64,
    validate_stock: bool,
) -> crate::error::Result<bool> {
    let current_obj = objective(index, solution, lambda);
    let mut best: Option<(OrderId, f64)> = None;

    for &o in solution.selected_orders() {
        let remaining_units = solution.total_units() - index.total_units[o];
        if remaining_units < instance.lb() {
            continue;
        }
        let v = parametric_value(index, o, lambda);
        let candidate_obj = current_obj - v;
        if candidate_obj > current_obj
            && best.map_or(true, |(_, best_obj)| candidate_obj > best_obj)
        {
            best = Some((o, candidate_obj));
        }
    }

    let Some((order, _)) = best else {
        return Ok(false);
    };

    let before = solution.clone();
    if solution.remove_order(order, instance, index).is_err() {
        *solution = before;
        return Ok(false);
    }
    if !feasibility::check(solution, instance, validate_stock).is_feasible() {
        *solution = before;
        return Ok(false);
    }
    Ok(true)
}

fn try_swap(
    instance: &Instance,
    index: &IndexBundle,
    solution: &mut Solution,
    lambda: f64,
    validate_stock: bool,
) -> crate::error::Result<bool> {
    let current_obj = objective(index, solution, lambda);
    let mut best: Option<(OrderId, OrderId, f64)> = None;

    let selected: Vec<OrderId> = solution.selected_orders().iter().copied().collect();
    for &remove in &selected {
        let units_after_removal = solution.total_units() - index.total_units[remove];
        for add in 0..instance.num_orders() {
            if solution.selected_orders().contains(&add) {
                continue;
            }
            let units_after = units_after_removal + index.total_units[add];
            if units_after > instance.ub() {
                continue;
            }
            let candidate_obj =
                current_obj - parametric_value(index, remove, lambda) + parametric_value(index, add, lambda);
            if candidate_obj > current_obj
                && best.map_or(true, |(_, _, best_obj)| candidate_obj > best_obj)
            {
                best = Some((remove, add, candidate_obj));
            }
        }
    }

    let Some((remove, add, _)) = best else {
        return Ok(false);
    };

    let before = solution.clone();
    if solution.remove_order(remove, instance, index).is_err()
        || solution.add_order(add, instance, index).is_err()
    {
        *solution = before;
        return Ok(false);
    }
    let feasible = feasibility::check(solution, instance, validate_stock).is_feasible()
        && solution.total_units() >= instance.lb();
    if !feasible {
        *solution = before;
        return Ok(false);
    }
    Ok(true)
}

/// Whether `feasibility` represents a passing check, exposed for callers
/// that only have a [`Feasibility`] value in hand (e.g. the Dinkelbach
/// loop after recomputing the cover).
pub fn is_feasible(feasibility: Feasibility) -> bool {
    feasibility.is_feasible()
}
