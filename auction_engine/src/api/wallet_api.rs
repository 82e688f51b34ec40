use std::fmt::Debug;

use cap_common::Money;
use log::*;

use crate::{
    db_types::{CommissionTransaction, MasterId, MasterProfile, WalletTransaction},
    traits::{AuctionError, BatchSettlement, WalletManagement},
};

/// The `WalletApi` drives a master's prepaid wallet: deposits in, commission settlements out.
///
/// Like the accept-bid settlement, every wallet mutation is retried exactly once when the store aborts with a
/// retryable lock conflict; a second conflict surfaces as [`AuctionError::SettlementFailed`].
pub struct WalletApi<B> {
    db: B,
}

impl<B> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi")
    }
}

impl<B> WalletApi<B>
where B: WalletManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The master's commission profile, created on first contact.
    pub async fn profile(&self, master: &MasterId) -> Result<MasterProfile, AuctionError> {
        self.db.fetch_or_create_profile(master).await
    }

    pub async fn deposit(
        &self,
        master: &MasterId,
        amount: Money,
        method: &str,
        details: Option<String>,
    ) -> Result<WalletTransaction, AuctionError> {
        match self.db.deposit(master, amount, method, details.clone()).await {
            Err(e) if e.is_retryable() => {
                warn!("🔄️💰️ deposit hit a lock conflict ({e}). Retrying once.");
                self.db.deposit(master, amount, method, details).await.map_err(|e| {
                    if e.is_retryable() {
                        AuctionError::SettlementFailed(format!(
                            "Persistent lock conflict depositing into [{master}]'s wallet"
                        ))
                    } else {
                        e
                    }
                })
            },
            other => other,
        }
    }

    pub async fn pay_commission(
        &self,
        master: &MasterId,
        commission_tx_id: i64,
    ) -> Result<CommissionTransaction, AuctionError> {
        match self.db.pay_commission(master, commission_tx_id).await {
            Err(e) if e.is_retryable() => {
                warn!("🔄️💰️ pay_commission hit a lock conflict ({e}). Retrying once.");
                self.db.pay_commission(master, commission_tx_id).await.map_err(|e| {
                    if e.is_retryable() {
                        AuctionError::SettlementFailed(format!(
                            "Persistent lock conflict settling commission #{commission_tx_id}"
                        ))
                    } else {
                        e
                    }
                })
            },
            other => other,
        }
    }

    pub async fn pay_all_pending(&self, master: &MasterId) -> Result<BatchSettlement, AuctionError> {
        match self.db.pay_all_pending(master).await {
            Err(e) if e.is_retryable() => {
                warn!("🔄️💰️ pay_all_pending hit a lock conflict ({e}). Retrying once.");
                self.db.pay_all_pending(master).await.map_err(|e| {
                    if e.is_retryable() {
                        AuctionError::SettlementFailed(format!(
                            "Persistent lock conflict settling [{master}]'s pending commissions"
                        ))
                    } else {
                        e
                    }
                })
            },
            other => other,
        }
    }
}
