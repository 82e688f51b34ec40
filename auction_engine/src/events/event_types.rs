use serde::{Deserialize, Serialize};

use crate::{db_types::Bid, traits::AcceptedBid};

/// Emitted after a bid has been accepted and the settlement transaction has committed.
///
/// Subscribers use this to create the order's chat channel (idempotent, keyed by order id) and to notify the winning
/// and losing masters. Handler failures never unwind the settlement; by the time this event exists, the money has
/// moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidAcceptedEvent {
    pub accepted: AcceptedBid,
}

impl BidAcceptedEvent {
    pub fn new(accepted: AcceptedBid) -> Self {
        Self { accepted }
    }
}

/// Emitted after a bid has been recorded, so the order's customer can be notified of new competition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidPlacedEvent {
    pub bid: Bid,
}

impl BidPlacedEvent {
    pub fn new(bid: Bid) -> Self {
        Self { bid }
    }
}
