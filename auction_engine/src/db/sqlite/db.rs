use std::fmt::Debug;

use cap_common::Money;
use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{bids, commissions, db_url, new_pool, orders, profiles, wallet};
use crate::{
    commission::{compute_commission, CommissionConfig},
    db_types::{
        Bid, BidStatusType, CommissionStatus, CommissionTransaction, CustomerId, DeliveryStatus, MasterId,
        MasterProfile, NewBid, NewOrder, Order, OrderId, OrderStatusType, WalletTransaction, WalletTxType,
    },
    traits::{
        AcceptedBid, AuctionDatabase, AuctionError, BatchSettlement, CompetitionSummary, MarketReader,
        WalletManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, AuctionError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, AuctionError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AuctionDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, AuctionError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn submit_bid(&self, bid: NewBid) -> Result<Bid, AuctionError> {
        if !bid.price.is_positive() {
            return Err(AuctionError::InvalidAmount(bid.price));
        }
        if bid.days <= 0 {
            return Err(AuctionError::InvalidDuration(bid.days));
        }
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(&bid.order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(bid.order_id.clone()))?;
        if order.status != OrderStatusType::Auction {
            return Err(AuctionError::OrderNotInAuction { order_id: order.order_id, status: order.status });
        }
        // First contact creates the commission profile, so the enrollment clock starts at the first bid.
        let _ = profiles::fetch_or_create_profile(&bid.master_id, &mut tx).await?;
        let owed = commissions::pending_total(&bid.master_id, &mut tx).await?;
        if owed.is_positive() {
            debug!("🔨️ Master [{}] is blocked from bidding: {owed} in unpaid commissions", bid.master_id);
            return Err(AuctionError::UnpaidCommissionsExist { master_id: bid.master_id, owed });
        }
        let bid = bids::upsert_bid(bid, &mut tx).await?;
        tx.commit().await?;
        Ok(bid)
    }

    async fn withdraw_bid(&self, bid_id: i64, master: &MasterId) -> Result<(), AuctionError> {
        let mut tx = self.pool.begin().await?;
        let bid = bids::fetch_bid(bid_id, &mut tx).await?.ok_or(AuctionError::BidNotFound(bid_id))?;
        if &bid.master_id != master {
            return Err(AuctionError::NotBidOwner { bid_id, master_id: master.clone() });
        }
        let order = orders::fetch_order_by_order_id(&bid.order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(bid.order_id.clone()))?;
        if order.status != OrderStatusType::Auction {
            return Err(AuctionError::OrderNotInAuction { order_id: order.order_id, status: order.status });
        }
        bids::delete_bid(bid_id, &mut tx).await?;
        debug!("🔨️ Bid #{bid_id} withdrawn by [{master}]");
        tx.commit().await?;
        Ok(())
    }

    async fn accept_bid(
        &self,
        bid_id: i64,
        customer: &CustomerId,
        config: &CommissionConfig,
        now: DateTime<Utc>,
    ) -> Result<AcceptedBid, AuctionError> {
        let mut tx = self.pool.begin().await?;
        let bid = bids::fetch_bid(bid_id, &mut tx).await?.ok_or(AuctionError::BidNotFound(bid_id))?;
        let order = orders::fetch_order_by_order_id(&bid.order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(bid.order_id.clone()))?;
        if &order.customer_id != customer {
            return Err(AuctionError::NotOrderOwner { order_id: order.order_id, customer_id: customer.clone() });
        }
        if order.status != OrderStatusType::Auction {
            return Err(AuctionError::OrderNotInAuction { order_id: order.order_id, status: order.status });
        }
        let profile = profiles::fetch_or_create_profile(&bid.master_id, &mut tx).await?;
        // Re-check the debt gate: the master may have gone into debt since the bid was placed.
        let owed = commissions::pending_total(&bid.master_id, &mut tx).await?;
        if owed.is_positive() {
            debug!("🔨️ Cannot accept bid #{bid_id}: master [{}] owes {owed}", bid.master_id);
            return Err(AuctionError::UnpaidCommissionsExist { master_id: bid.master_id, owed });
        }
        let quote = compute_commission(&profile, bid.price, now, config)?;
        let auto_paid = profile.wallet_balance >= quote.amount;

        orders::assign_master(&order.order_id, &bid.master_id, bid.price, &mut tx).await?;
        bids::set_bid_status(bid.id, BidStatusType::Accepted, &mut tx).await?;
        let rejected = bids::reject_competing_bids(&order.order_id, bid.id, &mut tx).await?;
        trace!("🔨️ Bid #{bid_id} accepted on order {}; {rejected} competing bids rejected", order.order_id);

        let status = if auto_paid { CommissionStatus::Paid } else { CommissionStatus::Pending };
        let commission =
            commissions::insert_commission(&bid.master_id, &order.order_id, bid.price, &quote, status, &mut tx)
                .await?;
        if quote.tier == crate::db_types::CommissionTier::FirstMonth {
            profiles::incr_first_month_orders(&bid.master_id, &mut tx).await?;
        }
        if auto_paid {
            profiles::adjust_balances(&bid.master_id, -quote.amount, Money::from(0), quote.amount, &mut tx).await?;
            wallet::append_transaction(
                &bid.master_id,
                -quote.amount,
                WalletTxType::CommissionPayment,
                Some(commission.id),
                None,
                None,
                &mut tx,
            )
            .await?;
            debug!("🔨️ Commission of {} auto-paid from [{}]'s wallet", quote.amount, bid.master_id);
        } else {
            profiles::adjust_balances(&bid.master_id, Money::from(0), quote.amount, Money::from(0), &mut tx).await?;
            debug!("🔨️ Commission of {} registered as debt for [{}]", quote.amount, bid.master_id);
        }

        let order = orders::fetch_order_by_order_id(&order.order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::SettlementFailed("Order vanished mid-settlement".to_string()))?;
        let bid = bids::fetch_bid(bid.id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::SettlementFailed("Bid vanished mid-settlement".to_string()))?;
        tx.commit().await?;
        info!(
            "🔨️ Order {} assigned to [{}] at {}. Commission: {} ({}).",
            order.order_id,
            bid.master_id,
            bid.price,
            commission.commission_amount,
            if auto_paid { "auto-paid" } else { "pending" }
        );
        Ok(AcceptedBid { order, bid, commission, auto_paid })
    }

    async fn mark_shipped(&self, order_id: &OrderId, master: &MasterId) -> Result<Order, AuctionError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        if order.assigned_master.as_ref() != Some(master) {
            return Err(AuctionError::NotAssignedMaster { order_id: order.order_id, master_id: master.clone() });
        }
        if order.status != OrderStatusType::InProgress || order.delivery_status != DeliveryStatus::Pending {
            return Err(AuctionError::InvalidDeliveryState {
                order_id: order.order_id,
                current: order.delivery_status,
                requested: DeliveryStatus::Shipped,
            });
        }
        orders::update_delivery_status(order_id, DeliveryStatus::Shipped, &mut tx).await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🚚️ Order {order_id} marked as shipped by [{master}]");
        Ok(order)
    }

    async fn confirm_delivery(&self, order_id: &OrderId, customer: &CustomerId) -> Result<Order, AuctionError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        if &order.customer_id != customer {
            return Err(AuctionError::NotOrderOwner { order_id: order.order_id, customer_id: customer.clone() });
        }
        if order.status != OrderStatusType::InProgress || order.delivery_status != DeliveryStatus::Shipped {
            return Err(AuctionError::InvalidDeliveryState {
                order_id: order.order_id,
                current: order.delivery_status,
                requested: DeliveryStatus::Delivered,
            });
        }
        // Delivered closes the delivery axis and completes the order in the same transaction.
        orders::update_delivery_status(order_id, DeliveryStatus::Delivered, &mut tx).await?;
        orders::update_order_status(order_id, OrderStatusType::Completed, &mut tx).await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        info!("🚚️ Order {order_id} delivered and completed");
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, AuctionError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        if !order.status.can_transition(OrderStatusType::Cancelled) {
            return Err(AuctionError::InvalidOrderTransition {
                order_id: order.order_id,
                from: order.status,
                to: OrderStatusType::Cancelled,
            });
        }
        orders::update_order_status(order_id, OrderStatusType::Cancelled, &mut tx).await?;
        let rejected = bids::reject_all_pending(order_id, &mut tx).await?;
        // An unsettled commission dies with the order; a paid one stays paid.
        if let Some(ctx) = commissions::fetch_commission_for_order(order_id, &mut tx).await? {
            if ctx.status == CommissionStatus::Pending {
                commissions::mark_cancelled(ctx.id, &mut tx).await?;
                profiles::adjust_balances(
                    &ctx.master_id,
                    Money::from(0),
                    -ctx.commission_amount,
                    Money::from(0),
                    &mut tx,
                )
                .await?;
                debug!("🧾️ Pending commission #{} cancelled with order {order_id}", ctx.id);
            }
        }
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| AuctionError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        info!("🗑️ Order {order_id} cancelled. {rejected} pending bids rejected.");
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), AuctionError> {
        self.pool.close().await;
        Ok(())
    }
}

impl WalletManagement for SqliteDatabase {
    async fn fetch_or_create_profile(&self, master: &MasterId) -> Result<MasterProfile, AuctionError> {
        let mut conn = self.pool.acquire().await?;
        profiles::fetch_or_create_profile(master, &mut conn).await
    }

    async fn deposit(
        &self,
        master: &MasterId,
        amount: Money,
        method: &str,
        details: Option<String>,
    ) -> Result<WalletTransaction, AuctionError> {
        if !amount.is_positive() {
            return Err(AuctionError::InvalidAmount(amount));
        }
        let mut tx = self.pool.begin().await?;
        let _ = profiles::fetch_or_create_profile(master, &mut tx).await?;
        let row =
            wallet::append_transaction(master, amount, WalletTxType::Deposit, None, Some(method), details, &mut tx)
                .await?;
        profiles::adjust_balances(master, amount, Money::from(0), Money::from(0), &mut tx).await?;
        tx.commit().await?;
        info!("💰️ [{master}] deposited {amount} via {method}");
        Ok(row)
    }

    async fn pay_commission(
        &self,
        master: &MasterId,
        commission_tx_id: i64,
    ) -> Result<CommissionTransaction, AuctionError> {
        let mut tx = self.pool.begin().await?;
        let ctx = commissions::fetch_commission(commission_tx_id, &mut tx)
            .await?
            .filter(|c| &c.master_id == master)
            .ok_or(AuctionError::CommissionNotFound(commission_tx_id))?;
        if ctx.status != CommissionStatus::Pending {
            return Err(AuctionError::CommissionAlreadySettled { tx_id: ctx.id, status: ctx.status });
        }
        let profile = profiles::fetch_or_create_profile(master, &mut tx).await?;
        if profile.wallet_balance < ctx.commission_amount {
            return Err(AuctionError::InsufficientBalance {
                required: ctx.commission_amount,
                available: profile.wallet_balance,
            });
        }
        commissions::mark_paid(ctx.id, &mut tx).await?;
        wallet::append_transaction(
            master,
            -ctx.commission_amount,
            WalletTxType::CommissionPayment,
            Some(ctx.id),
            None,
            None,
            &mut tx,
        )
        .await?;
        profiles::adjust_balances(
            master,
            -ctx.commission_amount,
            -ctx.commission_amount,
            ctx.commission_amount,
            &mut tx,
        )
        .await?;
        let ctx = commissions::fetch_commission(ctx.id, &mut tx)
            .await?
            .ok_or(AuctionError::CommissionNotFound(commission_tx_id))?;
        tx.commit().await?;
        info!("🧾️ Commission #{} of {} settled by [{master}]", ctx.id, ctx.commission_amount);
        Ok(ctx)
    }

    async fn pay_all_pending(&self, master: &MasterId) -> Result<BatchSettlement, AuctionError> {
        let mut tx = self.pool.begin().await?;
        let pending = commissions::pending_for_master(master, &mut tx).await?;
        if pending.is_empty() {
            return Ok(BatchSettlement { settled: vec![], total: Money::from(0) });
        }
        let total: Money = pending.iter().map(|c| c.commission_amount).sum();
        let profile = profiles::fetch_or_create_profile(master, &mut tx).await?;
        if profile.wallet_balance < total {
            debug!(
                "💰️ [{master}] cannot settle {} pending commissions: {total} required, {} available",
                pending.len(),
                profile.wallet_balance
            );
            return Err(AuctionError::InsufficientBalance { required: total, available: profile.wallet_balance });
        }
        let mut settled = Vec::with_capacity(pending.len());
        for ctx in pending {
            commissions::mark_paid(ctx.id, &mut tx).await?;
            wallet::append_transaction(
                master,
                -ctx.commission_amount,
                WalletTxType::CommissionPayment,
                Some(ctx.id),
                None,
                None,
                &mut tx,
            )
            .await?;
            let ctx = commissions::fetch_commission(ctx.id, &mut tx)
                .await?
                .ok_or(AuctionError::CommissionNotFound(ctx.id))?;
            settled.push(ctx);
        }
        profiles::adjust_balances(master, -total, -total, total, &mut tx).await?;
        tx.commit().await?;
        info!("🧾️ [{master}] settled {} commissions totalling {total}", settled.len());
        Ok(BatchSettlement { settled, total })
    }
}

impl MarketReader for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, AuctionError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn bids_for_order(&self, order_id: &OrderId) -> Result<Vec<Bid>, AuctionError> {
        let mut conn = self.pool.acquire().await?;
        bids::bids_for_order(order_id, &mut conn).await
    }

    async fn competition_summary(&self, order_id: &OrderId) -> Result<CompetitionSummary, AuctionError> {
        let mut conn = self.pool.acquire().await?;
        bids::competition_summary(order_id, &mut conn).await
    }

    async fn fetch_profile(&self, master: &MasterId) -> Result<Option<MasterProfile>, AuctionError> {
        let mut conn = self.pool.acquire().await?;
        profiles::fetch_profile(master, &mut conn).await
    }

    async fn pending_commissions(&self, master: &MasterId) -> Result<Vec<CommissionTransaction>, AuctionError> {
        let mut conn = self.pool.acquire().await?;
        commissions::pending_for_master(master, &mut conn).await
    }

    async fn wallet_history(&self, master: &MasterId) -> Result<Vec<WalletTransaction>, AuctionError> {
        let mut conn = self.pool.acquire().await?;
        wallet::history(master, &mut conn).await
    }
}
