use chrono::{DateTime, Utc};

use crate::{
    commission::CommissionConfig,
    db_types::{Bid, CustomerId, MasterId, NewBid, NewOrder, Order, OrderId},
    traits::{AcceptedBid, AuctionError},
};

/// This trait defines the write-side behaviour for backends supporting the auction engine.
///
/// Every method that touches more than one row MUST execute inside a single atomic transaction with isolation strong
/// enough that two concurrent [`AuctionDatabase::accept_bid`] calls on the same order cannot both succeed, and a
/// wallet debit cannot race a balance read. A failed operation rolls back completely; no partial state is ever
/// visible to other callers.
#[allow(async_fn_in_trait)]
pub trait AuctionDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order arriving from the customer-facing intake collaborator and places it in the `Auction`
    /// state. The insert is idempotent on `order_id`; replaying an order returns the stored row unchanged.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, AuctionError>;

    /// Records a master's proposal against an order, in a single atomic transaction:
    /// * fails with [`AuctionError::OrderNotInAuction`] if the order has left the auction state,
    /// * fails with [`AuctionError::UnpaidCommissionsExist`] if the master has any pending commission,
    /// * creates the master's commission profile if this is their first contact with the engine,
    /// * inserts the bid, or overwrites the master's existing bid on this order in place (price, days, note and
    ///   status are reset). One active bid per (order, master) pair, always.
    async fn submit_bid(&self, bid: NewBid) -> Result<Bid, AuctionError>;

    /// Deletes a bid. Fails with [`AuctionError::NotBidOwner`] if `master` does not own the bid, and with
    /// [`AuctionError::OrderNotInAuction`] if the order has already left the auction (bids are immutable from that
    /// point on).
    async fn withdraw_bid(&self, bid_id: i64, master: &MasterId) -> Result<(), AuctionError>;

    /// The critical operation: accepts a bid on behalf of the order's customer. In one atomic transaction:
    /// 1. loads the bid and its order, checking ownership,
    /// 2. re-checks that the winning master has no pending commission (debt may have been incurred since the bid
    ///    was placed),
    /// 3. computes the commission for the bid price under `config`,
    /// 4. transitions the order to `InProgress` with the master assigned and the final price fixed,
    /// 5. marks the winning bid `Accepted` and every other pending bid on the order `Rejected`,
    /// 6. writes the commission transaction: `Paid` with an accompanying wallet debit if the wallet covers it,
    ///    `Pending` otherwise. An unaffordable commission is a debt, not a failure; the order proceeds either way.
    async fn accept_bid(
        &self,
        bid_id: i64,
        customer: &CustomerId,
        config: &CommissionConfig,
        now: DateTime<Utc>,
    ) -> Result<AcceptedBid, AuctionError>;

    /// Marks the order's work as shipped. Requires the caller to be the assigned master and the order to be
    /// `InProgress` with delivery still `Pending`.
    async fn mark_shipped(&self, order_id: &OrderId, master: &MasterId) -> Result<Order, AuctionError>;

    /// Confirms receipt of the delivered work. Requires the caller to be the order's customer and the delivery
    /// sub-status to be `Shipped`. Sets delivery to `Delivered` and completes the order.
    async fn confirm_delivery(&self, order_id: &OrderId, customer: &CustomerId) -> Result<Order, AuctionError>;

    /// The cancellation hook. Orders can be cancelled from `Auction` or `InProgress`; the cancellation *policy*
    /// (who may cancel, refunds, penalties) lives outside the engine. Atomically:
    /// * transitions the order to `Cancelled`,
    /// * rejects all pending bids,
    /// * cancels a pending commission transaction for the order, reducing the master's commission balance. A
    ///   commission that was already paid stays paid.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, AuctionError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), AuctionError> {
        Ok(())
    }
}
