//! Constructive Builder (C5): three-stage fallback initial solution.

use crate::cover;
use crate::index::IndexBundle;
use crate::instance::Instance;
use crate::solution::Solution;
use crate::types::OrderId;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Result of [`build`]: the constructed solution plus whether it reached
/// LB (`warning` is set when it did not — "best partial solution
/// together with a warning flag" per spec.md §4.4).
pub struct ConstructResult {
    /// The constructed solution.
    pub solution: Solution,
    /// Set if `solution.total_units() < instance.lb()`.
    pub below_lower_bound: bool,
}

/// Build an initial feasible solution via the efficiency-first /
/// volume-first / linear-scan fallback chain described in spec.md §4.4.
#[tracing::instrument(skip_all)]
pub fn build(instance: &Instance, index: &IndexBundle, worker_count: usize) -> crate::error::Result<ConstructResult> {
    if let Some(solution) = stage_rank(instance, index, worker_count, RankBy::Efficiency)? {
        return finalize(instance, index, solution);
    }
    tracing::debug!("stage 1 (efficiency-first) did not reach LB, falling back to volume-first");
    if let Some(solution) = stage_rank(instance, index, worker_count, RankBy::Volume)? {
        return finalize(instance, index, solution);
    }
    tracing::warn!("stage 2 (volume-first) did not reach LB, falling back to linear scan");
    let solution = stage_linear_scan(instance, index)?;
    finalize(instance, index, solution)
}

#[derive(Clone, Copy)]
enum RankBy {
    Efficiency,
    Volume,
}

/// Stage 1/2: rank all orders by a score (computed via K2 parallel fan-
/// out, then sorted sequentially for deterministic tie-breaks), and walk
/// the ranking adding orders while they fit UB and leave nonnegative
/// residual stock for every item.
fn stage_rank(
    instance: &Instance,
    index: &IndexBundle,
    worker_count: usize,
    rank_by: RankBy,
) -> crate::error::Result<Option<BTreeSet<OrderId>>> {
    let chunk_size = (instance.num_orders() + worker_count.max(1) - 1) / worker_count.max(1);
    let order_ids: Vec<OrderId> = (0..instance.num_orders()).collect();
    let mut scored: Vec<(OrderId, f64)> = order_ids
        .par_chunks(chunk_size.max(1))
        .flat_map_iter(|chunk| {
            chunk.iter().map(|&o| {
                let score = match rank_by {
                    RankBy::Efficiency => index.order_efficiency[o],
                    RankBy::Volume => index.total_units[o] as f64,
                };
                (o, score)
            })
        })
        .collect();
    scored.sort_by(|a, b| {
        OrderedFloat(b.1)
            .cmp(&OrderedFloat(a.1))
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut residual_stock: Vec<i64> = (0..instance.num_items())
        .map(|i| index.total_item_supply[i] as i64)
        .collect();
    let mut selected = BTreeSet::new();
    let mut total_units: u64 = 0;

    for (o, _) in scored {
        let order_units = index.total_units[o];
        if total_units + order_units > instance.ub() {
            continue;
        }
        let demand = instance.order_demand(o);
        let fits = demand.iter().all(|(item, qty)| residual_stock[item] - (qty as i64) >= 0);
        if !fits {
            continue;
        }
        for (item, qty) in demand.iter() {
            residual_stock[item] -= qty as i64;
        }
        selected.insert(o);
        total_units += order_units;

        if total_units >= instance.lb() {
            return Ok(Some(selected));
        }
    }

    Ok(None)
}

/// Stage 3: iterate OrderIds in order, adding any that still fit; the
/// aisle cover here is a superset (every aisle stocking any demanded
/// item) and is tightened by C3 in [`finalize`].
fn stage_linear_scan(instance: &Instance, index: &IndexBundle) -> crate::error::Result<BTreeSet<OrderId>> {
    let mut residual_stock: Vec<i64> = (0..instance.num_items())
        .map(|i| index.total_item_supply[i] as i64)
        .collect();
    let mut selected = BTreeSet::new();
    let mut total_units: u64 = 0;

    for o in 0..instance.num_orders() {
        let order_units = index.total_units[o];
        if total_units + order_units > instance.ub() {
            continue;
        }
        let demand = instance.order_demand(o);
        let fits = demand.iter().all(|(item, qty)| residual_stock[item] - (qty as i64) >= 0);
        if !fits {
            continue;
        }
        for (item, qty) in demand.iter() {
            residual_stock[item] -= qty as i64;
        }
        selected.insert(o);
        total_units += order_units;
    }

    Ok(selected)
}

fn finalize(instance: &Instance, index: &IndexBundle, orders: BTreeSet<OrderId>) -> crate::error::Result<ConstructResult> {
    let mut solution = Solution::empty();
    solution.replace_orders(orders, instance, index)?;
    let below_lower_bound = solution.total_units() < instance.lb();
    Ok(ConstructResult {
        solution,
        below_lower_bound,
    })
}
