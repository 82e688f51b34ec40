use std::fmt::Display;

use auction_engine::{
    db_types::{Bid, NewBid, NewOrder, Order, OrderId},
    traits::AcceptedBid,
};
use cap_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The intake payload forwarded by the customer-facing order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub order_id: OrderId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub budget_min: Option<Money>,
    pub budget_max: Option<Money>,
    pub deadline: Option<DateTime<Utc>>,
}

impl NewOrderRequest {
    pub fn into_new_order(self, customer_id: auction_engine::db_types::CustomerId) -> NewOrder {
        let mut order = NewOrder::new(self.order_id, customer_id, self.title).with_description(self.description);
        if let (Some(min), Some(max)) = (self.budget_min, self.budget_max) {
            order = order.with_budget(min, max);
        }
        order.deadline = self.deadline;
        order
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRequest {
    pub price: Money,
    pub days: i64,
    pub note: Option<String>,
}

impl BidRequest {
    pub fn into_new_bid(self, order_id: OrderId, master_id: auction_engine::db_types::MasterId) -> NewBid {
        let bid = NewBid::new(order_id, master_id, self.price, self.days);
        match self.note {
            Some(note) => bid.with_note(note),
            None => bid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amount: Money,
    pub method: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayCommissionRequest {
    pub commission_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateCommissionRequest {
    pub order_amount: Money,
}

/// The response to a successful bid acceptance. `commission_paid` tells the master whether the fee was debited from
/// the wallet on the spot or is now owed as a blocking debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub order: Order,
    pub bid: Bid,
    pub commission_amount: Money,
    pub commission_paid: bool,
}

impl From<AcceptedBid> for SettlementResult {
    fn from(accepted: AcceptedBid) -> Self {
        Self {
            commission_amount: accepted.commission.commission_amount,
            commission_paid: accepted.auto_paid,
            order: accepted.order,
            bid: accepted.bid,
        }
    }
}
