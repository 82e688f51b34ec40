use cap_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Bid, CommissionTransaction, Order};

/// The result of a successful `accept_bid` call.
///
/// `auto_paid` distinguishes the two legitimate outcomes: the commission was settled from the wallet on the spot, or
/// it was registered as a debt. Both leave the order in progress; the debt only blocks *future* bids and wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedBid {
    pub order: Order,
    pub bid: Bid,
    pub commission: CommissionTransaction,
    pub auto_paid: bool,
}

/// The result of settling a batch of pending commissions in one atomic unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettlement {
    pub settled: Vec<CommissionTransaction>,
    pub total: Money,
}

/// Anonymized bid pressure for an order: competing masters can gauge the field without learning who is in it.
/// Only pending bids are counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitionSummary {
    pub bid_count: i64,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub avg_price: Option<Money>,
}
