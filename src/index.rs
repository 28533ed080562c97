//! Index Builder (C2): precomputed dense indices over an [`Instance`].
//!
//! Built in one pass (optionally fanned out across a `rayon` scope for
//! the K1 kernel) and read-only thereafter.

use crate::error::Result;
use crate::instance::Instance;
use crate::types::{AisleId, ItemId, OrderId, Quantity};
use bitvec::vec::BitVec;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Small candidate lists rarely exceed a handful of aisles in practice;
/// inline storage avoids heap churn in the hot cover/scoring loops.
pub type AisleList = SmallVec<[AisleId; 8]>;

/// Precomputed, read-only indices over an [`Instance`].
#[derive(Debug, Clone)]
pub struct IndexBundle {
    /// `totalUnits[o]`: sum of quantities demanded by order `o`.
    pub total_units: Vec<Quantity>,
    /// `itemAisles[i]`: ascending AisleIds stocking item `i`.
    pub item_aisles: Vec<AisleList>,
    /// `orderRequiredAisles[o]`: bit-parallel set of AisleIds stocking at
    /// least one item of order `o` (the minimal candidate cover).
    pub order_required_aisles: Vec<BitVec>,
    /// `orderEfficiency[o]`: `totalUnits[o] / |orderRequiredAisles[o]|`,
    /// or 0 if the denominator is 0.
    pub order_efficiency: Vec<f64>,
    /// `totalItemSupply[i]`: sum of stock of item `i` across all aisles.
    pub total_item_supply: Vec<Quantity>,
    num_aisles: usize,
}

impl IndexBundle {
    /// Build the index bundle in one linear sweep (parallelized across
    /// `worker_count` chunks for K1; merge is sequential and
    /// deterministic regardless of chunk count).
    #[tracing::instrument(skip_all, fields(num_orders = instance.num_orders(), num_aisles = instance.num_aisles()))]
    pub fn build(instance: &Instance, worker_count: usize) -> Result<Self> {
        let num_items = instance.num_items();
        let num_aisles = instance.num_aisles();
        let num_orders = instance.num_orders();

        // K1: item -> aisles, partitioned over aisle ranges, merged by
        // concatenating per-chunk (item -> aisle) pairs then sorting once.
        let aisle_ids: Vec<AisleId> = (0..num_aisles).collect();
        let chunk_size = chunk_size_for(num_aisles, worker_count);
        let mut item_aisles: Vec<AisleList> = vec![AisleList::new(); num_items];
        let mut total_item_supply: Vec<Quantity> = vec![0; num_items];

        let per_chunk: Vec<Vec<(ItemId, AisleId, Quantity)>> = aisle_ids
            .par_chunks(chunk_size.max(1))
            .map(|chunk| {
                let mut local = Vec::new();
                for &a in chunk {
                    for (item, qty) in instance.aisle_stock(a).iter() {
                        local.push((item, a, qty));
                    }
                }
                local
            })
            .collect();

        for chunk in per_chunk {
            for (item, aisle, qty) in chunk {
                item_aisles[item].push(aisle);
                total_item_supply[item] += qty;
            }
        }
        for list in &mut item_aisles {
            list.sort_unstable();
        }

        // K1: orders -> (totalUnits, orderRequiredAisles), partitioned
        // over order ranges; each chunk's contribution is independent.
        let order_ids: Vec<OrderId> = (0..num_orders).collect();
        let order_chunk_size = chunk_size_for(num_orders, worker_count);
        let per_order_chunk: Vec<Vec<(OrderId, Quantity, BitVec)>> = order_ids
            .par_chunks(order_chunk_size.max(1))
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|&o| {
                        let demand = instance.order_demand(o);
                        let mut required = BitVec::repeat(false, num_aisles);
                        let mut units = 0;
                        for (item, qty) in demand.iter() {
                            units += qty;
                            for &aisle in item_aisles[item].iter() {
                                required.set(aisle, true);
                            }
                        }
                        (o, units, required)
                    })
                    .collect()
            })
            .collect();

        let mut total_units = vec![0u64; num_orders];
        let mut order_required_aisles = vec![BitVec::repeat(false, num_aisles); num_orders];
        for chunk in per_order_chunk {
            for (o, units, required) in chunk {
                total_units[o] = units;
                order_required_aisles[o] = required;
            }
        }

        let order_efficiency: Vec<f64> = (0..num_orders)
            .map(|o| {
                let denom = order_required_aisles[o].count_ones();
                if denom == 0 {
                    0.0
                } else {
                    total_units[o] as f64 / denom as f64
                }
            })
            .collect();

        Ok(Self {
            total_units,
            item_aisles,
            order_required_aisles,
            order_efficiency,
            total_item_supply,
            num_aisles,
        })
    }

    /// Number of aisles this bundle was built against (bit-width of every
    /// `order_required_aisles` entry).
    pub fn num_aisles(&self) -> usize {
        self.num_aisles
    }
}

fn chunk_size_for(len: usize, worker_count: usize) -> usize {
    let workers = worker_count.max(1);
    (len + workers - 1) / workers
}
