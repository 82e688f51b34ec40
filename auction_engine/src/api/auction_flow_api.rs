use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    commission::CommissionConfig,
    db_types::{Bid, CustomerId, MasterId, NewBid, NewOrder, Order, OrderId},
    events::{BidAcceptedEvent, BidPlacedEvent, EventProducers},
    traits::{AcceptedBid, AuctionDatabase, AuctionError},
};

/// `AuctionFlowApi` is the primary API for driving an order through its lifecycle: intake, bidding, the atomic
/// accept-bid settlement, delivery, and cancellation.
pub struct AuctionFlowApi<B> {
    db: B,
    config: CommissionConfig,
    producers: EventProducers,
}

impl<B> Debug for AuctionFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuctionFlowApi")
    }
}

impl<B> AuctionFlowApi<B> {
    pub fn new(db: B, config: CommissionConfig, producers: EventProducers) -> Self {
        Self { db, config, producers }
    }

    pub fn commission_config(&self) -> &CommissionConfig {
        &self.config
    }
}

impl<B> AuctionFlowApi<B>
where B: AuctionDatabase
{
    /// Accepts an order from the customer-facing intake collaborator and opens its auction. Idempotent on order id.
    pub async fn process_new_order(&self, order: NewOrder) -> Result<Order, AuctionError> {
        let order = self.db.insert_order(order).await?;
        debug!("🔄️📦️ Order {} is open for bidding", order.order_id);
        Ok(order)
    }

    /// Records a master's bid and notifies subscribers. The notification is fire-and-forget: a failed or slow
    /// subscriber has no effect on the recorded bid.
    pub async fn submit_bid(&self, bid: NewBid) -> Result<Bid, AuctionError> {
        let bid = self.db.submit_bid(bid).await?;
        self.call_bid_placed_hook(&bid).await;
        Ok(bid)
    }

    pub async fn withdraw_bid(&self, bid_id: i64, master: &MasterId) -> Result<(), AuctionError> {
        self.db.withdraw_bid(bid_id, master).await
    }

    /// Accepts a bid on behalf of the order's customer.
    ///
    /// The settlement runs in a single atomic transaction in the backend. If the store aborts with a retryable lock
    /// conflict the call is retried exactly once against fresh state; a second conflict surfaces as
    /// [`AuctionError::SettlementFailed`]. On success the bid-accepted hook fires (chat channel creation and
    /// notifications) outside the transaction.
    pub async fn accept_bid(&self, bid_id: i64, customer: &CustomerId) -> Result<AcceptedBid, AuctionError> {
        let result = match self.db.accept_bid(bid_id, customer, &self.config, Utc::now()).await {
            Err(e) if e.is_retryable() => {
                warn!("🔄️🔨️ accept_bid hit a lock conflict ({e}). Retrying once.");
                self.db.accept_bid(bid_id, customer, &self.config, Utc::now()).await.map_err(|e| {
                    if e.is_retryable() {
                        AuctionError::SettlementFailed(format!("Persistent lock conflict accepting bid #{bid_id}"))
                    } else {
                        e
                    }
                })
            },
            other => other,
        }?;
        self.call_bid_accepted_hook(&result).await;
        Ok(result)
    }

    pub async fn mark_shipped(&self, order_id: &OrderId, master: &MasterId) -> Result<Order, AuctionError> {
        self.db.mark_shipped(order_id, master).await
    }

    pub async fn confirm_delivery(&self, order_id: &OrderId, customer: &CustomerId) -> Result<Order, AuctionError> {
        self.db.confirm_delivery(order_id, customer).await
    }

    /// The cancellation hook. The policy of who may cancel, and when, lives with the caller.
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, AuctionError> {
        self.db.cancel_order(order_id).await
    }

    async fn call_bid_accepted_hook(&self, accepted: &AcceptedBid) {
        for emitter in &self.producers.bid_accepted_producer {
            debug!("🔄️📬️ Notifying bid-accepted subscribers for order {}", accepted.order.order_id);
            let event = BidAcceptedEvent::new(accepted.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_bid_placed_hook(&self, bid: &Bid) {
        for emitter in &self.producers.bid_placed_producer {
            let event = BidPlacedEvent::new(bid.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
