//! The mutable [`Solution`] working object (§3) and its invariant-
//! preserving mutators.

use crate::cover;
use crate::index::IndexBundle;
use crate::instance::Instance;
use crate::types::{AisleId, OrderId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A candidate wave: a set of selected orders together with a valid
/// aisle cover. `total_units` and `ratio` are cached and kept consistent
/// with the sets by every mutator below — callers never need to
/// recompute them by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    selected_orders: BTreeSet<OrderId>,
    visited_aisles: BTreeSet<AisleId>,
    total_units: u64,
    ratio: f64,
}

impl Solution {
    /// The empty solution: no orders, no aisles.
    pub fn empty() -> Self {
        Self {
            selected_orders: BTreeSet::new(),
            visited_aisles: BTreeSet::new(),
            total_units: 0,
            ratio: 0.0,
        }
    }

    /// Currently selected orders.
    pub fn selected_orders(&self) -> &BTreeSet<OrderId> {
        &self.selected_orders
    }

    /// Currently visited aisles.
    pub fn visited_aisles(&self) -> &BTreeSet<AisleId> {
        &self.visited_aisles
    }

    /// Cached total picked units.
    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    /// Cached ratio (units / aisles), 0 if no aisles are visited.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Add `order` to the selection (no-op if already present), then
    /// recompute the aisle cover and cached fields.
    ///
    /// Returns `Err` (and leaves `self` unchanged) if the resulting
    /// demand cannot be covered by any aisle set — see [`cover::cover`].
    pub fn add_order(
        &mut self,
        order: OrderId,
        instance: &Instance,
        index: &IndexBundle,
    ) -> crate::error::Result<()> {
        if self.selected_orders.contains(&order) {
            return Ok(());
        }
        let mut candidate = self.selected_orders.clone();
        candidate.insert(order);
        self.recompute(candidate, instance, index)
    }

    /// Remove `order` from the selection (no-op if absent), then
    /// recompute the aisle cover and cached fields.
    pub fn remove_order(
        &mut self,
        order: OrderId,
        instance: &Instance,
        index: &IndexBundle,
    ) -> crate::error::Result<()> {
        if !self.selected_orders.contains(&order) {
            return Ok(());
        }
        let mut candidate = self.selected_orders.clone();
        candidate.remove(&order);
        self.recompute(candidate, instance, index)
    }

    /// Replace the order selection wholesale and recompute the cover.
    pub fn replace_orders(
        &mut self,
        orders: BTreeSet<OrderId>,
        instance: &Instance,
        index: &IndexBundle,
    ) -> crate::error::Result<()> {
        self.recompute(orders, instance, index)
    }

    /// Recompute `visited_aisles`/`total_units`/`ratio` for an explicit
    /// order set, tightening the cover via C3.
    fn recompute(
        &mut self,
        orders: BTreeSet<OrderId>,
        instance: &Instance,
        index: &IndexBundle,
    ) -> crate::error::Result<()> {
        let demand = cover::demand_for_orders(instance, orders.iter());
        let visited = cover::cover(instance, index, &demand)?;
        let total_units: u64 = orders.iter().map(|&o| index.total_units[o]).sum();
        let ratio = if visited.is_empty() {
            0.0
        } else {
            total_units as f64 / visited.len() as f64
        };
        self.selected_orders = orders;
        self.visited_aisles = visited;
        self.total_units = total_units;
        self.ratio = ratio;
        Ok(())
    }

    /// A plain, serializable view for interop with an external file
    /// writer (see §4.10 / §6).
    pub fn summary(&self) -> SolutionSummary {
        SolutionSummary {
            selected_orders: self.selected_orders.iter().copied().collect(),
            visited_aisles: self.visited_aisles.iter().copied().collect(),
            total_units: self.total_units,
            ratio: self.ratio,
        }
    }
}

/// Plain DTO view of a [`Solution`], ascending-sorted IDs, ready for an
/// external solution-file writer to serialize (§6: zero-based IDs,
/// count-then-list-per-line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSummary {
    /// Selected OrderIds, ascending.
    pub selected_orders: Vec<OrderId>,
    /// Visited AisleIds, ascending.
    pub visited_aisles: Vec<AisleId>,
    /// Total picked units.
    pub total_units: u64,
    /// Picked units / visited aisles (0.0 if no aisles visited).
    pub ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBundle;

    fn sample() -> (Instance, IndexBundle) {
        let inst = Instance::new(1, 2, 1, 0, 20, vec![vec![(0, 3)], vec![(0, 4)]], vec![vec![(0, 10)]]).unwrap();
        let idx = IndexBundle::build(&inst, 1).unwrap();
        (inst, idx)
    }

    #[test]
    fn add_then_remove_restores_empty_cover() {
        let (inst, idx) = sample();
        let mut sol = Solution::empty();
        sol.add_order(0, &inst, &idx).unwrap();
        assert_eq!(sol.total_units(), 3);
        assert_eq!(sol.visited_aisles().len(), 1);
        sol.remove_order(0, &inst, &idx).unwrap();
        assert_eq!(sol.total_units(), 0);
        assert!(sol.visited_aisles().is_empty());
        assert_eq!(sol.ratio(), 0.0);
    }

    #[test]
    fn ratio_reflects_units_over_aisles() {
        let (inst, idx) = sample();
        let mut sol = Solution::empty();
        sol.add_order(0, &inst, &idx).unwrap();
        sol.add_order(1, &inst, &idx).unwrap();
        assert_eq!(sol.total_units(), 7);
        assert_eq!(sol.ratio(), 7.0);
    }

    #[test]
    fn add_order_is_idempotent() {
        let (inst, idx) = sample();
        let mut sol = Solution::empty();
        sol.add_order(0, &inst, &idx).unwrap();
        sol.add_order(0, &inst, &idx).unwrap();
        assert_eq!(sol.selected_orders().len(), 1);
    }

    #[test]
    fn summary_round_trips_through_json() {
        let (inst, idx) = sample();
        let mut sol = Solution::empty();
        sol.add_order(0, &inst, &idx).unwrap();
        let summary = sol.summary();
        let json = serde_json::to_string(&summary).unwrap();
        let back: SolutionSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, back);
    }
}
