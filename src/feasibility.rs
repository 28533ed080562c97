//! Feasibility Oracle (C4): cheap, side-effect-free solution checks.

use crate::instance::Instance;
use crate::solution::Solution;
use crate::types::{AisleId, ItemId, OrderId};

/// Result of [`check`]. Variants are checked in the order listed, so the
/// first violation found is the one reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    /// All checks passed.
    Feasible,
    /// An OrderId in the solution is out of range.
    UnknownOrder(OrderId),
    /// An AisleId in the solution is out of range.
    UnknownAisle(AisleId),
    /// `total_units < LB`.
    BelowLowerBound,
    /// `total_units > UB`.
    AboveUpperBound,
    /// Demand for `item` exceeds supply across visited aisles.
    StockInsufficient(ItemId),
}

impl Feasibility {
    /// Whether this result represents a feasible solution.
    pub fn is_feasible(self) -> bool {
        matches!(self, Feasibility::Feasible)
    }
}

/// Check `solution` against `instance`'s bounds and, if
/// `validate_stock` is set, per-item stock coverage. No side effects;
/// cheap enough to call inside inner loops (C7/C8/C9 call this after
/// every accepted move).
pub fn check(solution: &Solution, instance: &Instance, validate_stock: bool) -> Feasibility {
    for &o in solution.selected_orders() {
        if instance.check_order(o).is_err() {
            return Feasibility::UnknownOrder(o);
        }
    }
    for &a in solution.visited_aisles() {
        if instance.check_aisle(a).is_err() {
            return Feasibility::UnknownAisle(a);
        }
    }

    let total = solution.total_units();
    if total < instance.lb() {
        return Feasibility::BelowLowerBound;
    }
    if total > instance.ub() {
        return Feasibility::AboveUpperBound;
    }

    if validate_stock {
        let mut demand = vec![0u64; instance.num_items()];
        for &o in solution.selected_orders() {
            for (item, qty) in instance.order_demand(o).iter() {
                demand[item] += qty;
            }
        }
        let mut supply = vec![0u64; instance.num_items()];
        for &a in solution.visited_aisles() {
            for (item, qty) in instance.aisle_stock(a).iter() {
                supply[item] += qty;
            }
        }
        for (item, (&need, &have)) in demand.iter().zip(supply.iter()).enumerate() {
            if need > have {
                return Feasibility::StockInsufficient(item);
            }
        }
    }

    Feasibility::Feasible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBundle;

    fn instance() -> Instance {
        Instance::new(1, 1, 1, 3, 8, vec![vec![(0, 5)]], vec![vec![(0, 5)]]).unwrap()
    }

    #[test]
    fn empty_solution_is_below_lower_bound() {
        let inst = instance();
        let sol = Solution::empty();
        assert_eq!(check(&sol, &inst, true), Feasibility::BelowLowerBound);
    }

    #[test]
    fn full_solution_is_feasible() {
        let inst = instance();
        let idx = IndexBundle::build(&inst, 1).unwrap();
        let mut sol = Solution::empty();
        sol.add_order(0, &inst, &idx).unwrap();
        assert_eq!(check(&sol, &inst, true), Feasibility::Feasible);
    }

    #[test]
    fn above_upper_bound_detected() {
        let inst = Instance::new(1, 1, 1, 0, 2, vec![vec![(0, 5)]], vec![vec![(0, 5)]]).unwrap();
        let idx = IndexBundle::build(&inst, 1).unwrap();
        let mut sol = Solution::empty();
        sol.add_order(0, &inst, &idx).unwrap();
        assert_eq!(check(&sol, &inst, true), Feasibility::AboveUpperBound);
    }
}
