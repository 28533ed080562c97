//! Instance Model (C1): immutable input data for a wave-picking problem.

use crate::error::{Error, Result};
use crate::types::{AisleId, ItemId, OrderId, Quantity};
use indexmap::IndexMap;

/// A single order or aisle's item demand/stock, keyed by item and summed
/// for duplicates. Stored sorted by `ItemId` for reproducible iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuantities {
    entries: Vec<(ItemId, Quantity)>,
}

impl ItemQuantities {
    fn from_pairs(num_items: usize, pairs: impl IntoIterator<Item = (ItemId, Quantity)>) -> Result<Self> {
        let mut acc: IndexMap<ItemId, Quantity> = IndexMap::new();
        for (item, qty) in pairs {
            if item >= num_items {
                return Err(Error::invalid_instance(format!(
                    "item {item} out of range [0, {num_items})"
                )));
            }
            *acc.entry(item).or_insert(0) += qty;
        }
        // drop zero-quantity pairs at ingest
        let mut entries: Vec<(ItemId, Quantity)> =
            acc.into_iter().filter(|&(_, q)| q > 0).collect();
        entries.sort_unstable_by_key(|&(item, _)| item);
        Ok(Self { entries })
    }

    /// Quantity demanded/stocked for `item`, or 0 if absent.
    pub fn get(&self, item: ItemId) -> Quantity {
        self.entries
            .binary_search_by_key(&item, |&(i, _)| i)
            .map(|idx| self.entries[idx].1)
            .unwrap_or(0)
    }

    /// Iterate over `(item, quantity)` pairs, ascending by item.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Quantity)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of distinct items present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no items are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of quantities across all items.
    pub fn total(&self) -> Quantity {
        self.entries.iter().map(|&(_, q)| q).sum()
    }
}

/// Immutable problem instance: orders, aisles, and the picked-units bound.
///
/// Constructed once via [`Instance::new`]; every invariant in the data
/// model is checked at construction, so downstream components never need
/// to re-validate.
#[derive(Debug, Clone)]
pub struct Instance {
    num_items: usize,
    num_orders: usize,
    num_aisles: usize,
    lb: u64,
    ub: u64,
    orders: Vec<ItemQuantities>,
    aisles: Vec<ItemQuantities>,
}

impl Instance {
    /// Build and validate a new instance.
    ///
    /// `orders[o]` and `aisles[a]` may contain duplicate item entries;
    /// duplicates are summed and zero-quantity pairs dropped. Every item
    /// id referenced must lie in `[0, num_items)`.
    pub fn new(
        num_items: usize,
        num_orders: usize,
        num_aisles: usize,
        lb: u64,
        ub: u64,
        orders: Vec<Vec<(ItemId, Quantity)>>,
        aisles: Vec<Vec<(ItemId, Quantity)>>,
    ) -> Result<Self> {
        if num_items == 0 || num_orders == 0 || num_aisles == 0 {
            return Err(Error::invalid_instance(
                "num_items, num_orders and num_aisles must all be positive",
            ));
        }
        if lb > ub {
            return Err(Error::invalid_instance(format!(
                "LB ({lb}) must not exceed UB ({ub})"
            )));
        }
        if orders.len() != num_orders {
            return Err(Error::invalid_instance(format!(
                "expected {num_orders} orders, got {}",
                orders.len()
            )));
        }
        if aisles.len() != num_aisles {
            return Err(Error::invalid_instance(format!(
                "expected {num_aisles} aisles, got {}",
                aisles.len()
            )));
        }

        let orders = orders
            .into_iter()
            .map(|pairs| ItemQuantities::from_pairs(num_items, pairs))
            .collect::<Result<Vec<_>>>()?;
        let aisles = aisles
            .into_iter()
            .map(|pairs| ItemQuantities::from_pairs(num_items, pairs))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            num_items,
            num_orders,
            num_aisles,
            lb,
            ub,
            orders,
            aisles,
        })
    }

    /// Number of distinct items.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Number of orders.
    pub fn num_orders(&self) -> usize {
        self.num_orders
    }

    /// Number of aisles.
    pub fn num_aisles(&self) -> usize {
        self.num_aisles
    }

    /// Inclusive lower bound on total picked units.
    pub fn lb(&self) -> u64 {
        self.lb
    }

    /// Inclusive upper bound on total picked units.
    pub fn ub(&self) -> u64 {
        self.ub
    }

    /// Demand for order `o`. Panics if `o` is out of range; callers in
    /// this crate always index within `[0, num_orders)`.
    pub fn order_demand(&self, o: OrderId) -> &ItemQuantities {
        &self.orders[o]
    }

    /// Stock for aisle `a`. Panics if `a` is out of range.
    pub fn aisle_stock(&self, a: AisleId) -> &ItemQuantities {
        &self.aisles[a]
    }

    /// Iterate over all orders as `(OrderId, &ItemQuantities)`.
    pub fn orders(&self) -> impl Iterator<Item = (OrderId, &ItemQuantities)> {
        self.orders.iter().enumerate()
    }

    /// Iterate over all aisles as `(AisleId, &ItemQuantities)`.
    pub fn aisles(&self) -> impl Iterator<Item = (AisleId, &ItemQuantities)> {
        self.aisles.iter().enumerate()
    }

    /// Validate that an OrderId is in range.
    pub fn check_order(&self, o: OrderId) -> Result<()> {
        if o < self.num_orders {
            Ok(())
        } else {
            Err(Error::UnknownOrder(o))
        }
    }

    /// Validate that an AisleId is in range.
    pub fn check_aisle(&self, a: AisleId) -> Result<()> {
        if a < self.num_aisles {
            Ok(())
        } else {
            Err(Error::UnknownAisle(a))
        }
    }
}
