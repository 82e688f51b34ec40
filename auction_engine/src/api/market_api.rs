use std::fmt::Debug;

use cap_common::Money;
use chrono::{DateTime, Utc};
use log::trace;

use crate::{
    commission::{compute_commission, CommissionConfig, CommissionQuote},
    db_types::{Bid, CommissionTransaction, CustomerId, MasterId, MasterProfile, Order, OrderId, WalletTransaction},
    traits::{AuctionError, CompetitionSummary, MarketReader},
};

/// Read-only views over the marketplace: bid listings for customers, anonymized competition summaries for masters,
/// and side-effect-free commission previews.
pub struct MarketApi<B> {
    db: B,
}

impl<B> Debug for MarketApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarketApi")
    }
}

impl<B> MarketApi<B>
where B: MarketReader
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn order(&self, order_id: &OrderId) -> Result<Option<Order>, AuctionError> {
        self.db.fetch_order(order_id).await
    }

    /// The full bid board for an order, cheapest first. Visible only to the order's customer; anyone else gets
    /// [`AuctionError::NotOrderOwner`].
    pub async fn list_bids(&self, order_id: &OrderId, customer: &CustomerId) -> Result<Vec<Bid>, AuctionError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        if &order.customer_id != customer {
            return Err(AuctionError::NotOrderOwner { order_id: order.order_id, customer_id: customer.clone() });
        }
        self.db.bids_for_order(order_id).await
    }

    /// Anonymized bid pressure for an order. Masters use this to gauge the field without learning who is in it.
    pub async fn competition_summary(&self, order_id: &OrderId) -> Result<CompetitionSummary, AuctionError> {
        let _ = self.db.fetch_order(order_id).await?.ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        self.db.competition_summary(order_id).await
    }

    pub async fn profile(&self, master: &MasterId) -> Result<Option<MasterProfile>, AuctionError> {
        self.db.fetch_profile(master).await
    }

    pub async fn pending_commissions(&self, master: &MasterId) -> Result<Vec<CommissionTransaction>, AuctionError> {
        self.db.pending_commissions(master).await
    }

    pub async fn wallet_history(&self, master: &MasterId) -> Result<Vec<WalletTransaction>, AuctionError> {
        self.db.wallet_history(master).await
    }

    /// A preview quote: what would this master owe for winning an order of `amount` right now? No state changes. A
    /// master the engine has never seen is quoted as brand-new (enrollment month, no billed orders).
    pub async fn commission_preview(
        &self,
        master: &MasterId,
        amount: Money,
        config: &CommissionConfig,
        now: DateTime<Utc>,
    ) -> Result<CommissionQuote, AuctionError> {
        let profile = match self.db.fetch_profile(master).await? {
            Some(p) => p,
            None => {
                trace!("🧮️ No profile for [{master}] yet; quoting as a new enrollment");
                new_master_profile(master, now)
            },
        };
        compute_commission(&profile, amount, now, config)
    }
}

fn new_master_profile(master: &MasterId, now: DateTime<Utc>) -> MasterProfile {
    MasterProfile {
        id: 0,
        master_id: master.clone(),
        enrolled_at: now,
        first_month_orders: 0,
        commission_balance: Money::default(),
        total_commission_paid: Money::default(),
        wallet_balance: Money::default(),
        created_at: now,
        updated_at: now,
    }
}
