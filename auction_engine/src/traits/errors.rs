use cap_common::Money;
use thiserror::Error;

use crate::db_types::{
    CommissionStatus, CustomerId, DeliveryStatus, MasterId, OrderId, OrderStatusType,
};

/// The error taxonomy for the auction engine.
///
/// Every failure path in the engine maps to one of these variants; nothing is silently swallowed. The variants fall
/// into the following groups, which the server layer maps onto HTTP status codes:
///
/// * Validation errors (`InvalidAmount`, `InvalidDuration`): rejected before any state change.
/// * Policy violations (`OrderNotInAuction`, `UnpaidCommissionsExist`, `NotBidOwner`, `NotOrderOwner`,
///   `NotAssignedMaster`): rejected before any state change, with enough detail for the UI to explain the block.
/// * Resource-state conflicts (`OrderNotFound`, `BidNotFound`, `CommissionAlreadySettled`, `InvalidDeliveryState`,
///   `InvalidOrderTransition`): the caller is working from a stale view and should refresh.
/// * Financial guard failures (`InsufficientBalance`): expected, recoverable outcomes carrying the required and
///   available amounts so the UI can prompt a top-up.
/// * `SettlementFailed` / `Database`: the store aborted; the transaction rolled back and no partial state exists.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("Amount must be positive. Got {0}.")]
    InvalidAmount(Money),
    #[error("Estimated duration must be a positive number of days. Got {0}.")]
    InvalidDuration(i64),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Bid #{0} not found")]
    BidNotFound(i64),
    #[error("Order {order_id} is not open for bidding. Current status: {status}.")]
    OrderNotInAuction { order_id: OrderId, status: OrderStatusType },
    #[error("Master [{master_id}] has unpaid commissions totalling {owed}")]
    UnpaidCommissionsExist { master_id: MasterId, owed: Money },
    #[error("Bid #{bid_id} does not belong to master [{master_id}]")]
    NotBidOwner { bid_id: i64, master_id: MasterId },
    #[error("Order {order_id} does not belong to customer [{customer_id}]")]
    NotOrderOwner { order_id: OrderId, customer_id: CustomerId },
    #[error("Master [{master_id}] is not the assigned master for order {order_id}")]
    NotAssignedMaster { order_id: OrderId, master_id: MasterId },
    #[error("Delivery for order {order_id} cannot move to {requested}. Current delivery status: {current}.")]
    InvalidDeliveryState { order_id: OrderId, current: DeliveryStatus, requested: DeliveryStatus },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidOrderTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Commission transaction #{0} not found")]
    CommissionNotFound(i64),
    #[error("Commission transaction #{tx_id} has already been settled. Status: {status}.")]
    CommissionAlreadySettled { tx_id: i64, status: CommissionStatus },
    #[error("Insufficient wallet balance. Required: {required}. Available: {available}.")]
    InsufficientBalance { required: Money, available: Money },
    #[error("Settlement failed: {0}")]
    SettlementFailed(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuctionError {
    /// Whether the underlying store aborted with a lock conflict that is worth retrying once.
    ///
    /// SQLite reports these as `SQLITE_BUSY`/`SQLITE_LOCKED`; a retry re-reads all state, so a competing writer that
    /// won the race will be observed on the second attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuctionError::Database(sqlx::Error::Database(e)) => {
                let msg = e.message();
                msg.contains("database is locked") || msg.contains("database table is locked")
            },
            _ => false,
        }
    }
}
