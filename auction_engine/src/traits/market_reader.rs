use crate::{
    db_types::{Bid, CommissionTransaction, MasterId, MasterProfile, Order, OrderId, WalletTransaction},
    traits::{AuctionError, CompetitionSummary},
};

/// Read-only queries over the marketplace. None of these take locks; they may run at read-committed isolation.
#[allow(async_fn_in_trait)]
pub trait MarketReader: Clone {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, AuctionError>;

    /// All bids for an order, cheapest first, ties broken by earliest submission.
    async fn bids_for_order(&self, order_id: &OrderId) -> Result<Vec<Bid>, AuctionError>;

    /// Count/min/max/average over the *pending* bids on an order, with no master identities.
    async fn competition_summary(&self, order_id: &OrderId) -> Result<CompetitionSummary, AuctionError>;

    async fn fetch_profile(&self, master: &MasterId) -> Result<Option<MasterProfile>, AuctionError>;

    /// The master's pending commission transactions, oldest first.
    async fn pending_commissions(&self, master: &MasterId) -> Result<Vec<CommissionTransaction>, AuctionError>;

    /// The master's full wallet ledger, oldest first.
    async fn wallet_history(&self, master: &MasterId) -> Result<Vec<WalletTransaction>, AuctionError>;
}
