//! Error types for the wave-picking solver

use crate::types::{AisleId, ItemId, OrderId};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or solving an instance.
///
/// Only [`Error::InvalidInstance`] and [`Error::InfeasibleBounds`] ever
/// escape [`crate::solve`] (see `SolveOutcome`); the remaining variants
/// are raised and consumed internally by C3/C4 and the movers in C7/C8.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Structural violation at ingest: bad header, ID out of range,
    /// non-positive quantity, or LB > UB.
    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    /// Instance-level stock can never reach LB regardless of order/aisle
    /// selection.
    #[error("infeasible bounds: {0}")]
    InfeasibleBounds(String),

    /// A candidate order set's demand exceeds total supply for an item.
    /// Raised by C3, caught by the move evaluator which rolls back.
    #[error("no cover: item {item} has insufficient total stock")]
    NoCover {
        /// The item whose demand cannot be met by any aisle set
        item: ItemId,
    },

    /// Reference to an order outside `[0, numOrders)`.
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    /// Reference to an aisle outside `[0, numAisles)`.
    #[error("unknown aisle {0}")]
    UnknownAisle(AisleId),
}

impl Error {
    /// Create an [`Error::InvalidInstance`]
    pub fn invalid_instance(msg: impl Into<String>) -> Self {
        Self::InvalidInstance(msg.into())
    }

    /// Create an [`Error::InfeasibleBounds`]
    pub fn infeasible_bounds(msg: impl Into<String>) -> Self {
        Self::InfeasibleBounds(msg.into())
    }

    /// Create an [`Error::NoCover`]
    pub fn no_cover(item: ItemId) -> Self {
        Self::NoCover { item }
    }
}
