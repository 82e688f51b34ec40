use cap_common::Money;

use crate::{
    db_types::{CommissionTransaction, MasterId, MasterProfile, WalletTransaction},
    traits::{AuctionError, BatchSettlement},
};

/// Wallet ledger behaviour for backends supporting the auction engine.
///
/// The wallet invariants hold at all times:
/// * `wallet_balance` never goes negative,
/// * every balance change appends exactly one wallet transaction row,
/// * the sum of a master's wallet transaction amounts equals the profile's `wallet_balance`.
#[allow(async_fn_in_trait)]
pub trait WalletManagement: Clone {
    /// Fetches the commission profile for the given master, creating a fresh one (enrolled now, empty wallet) if
    /// this is the master's first contact with the engine.
    async fn fetch_or_create_profile(&self, master: &MasterId) -> Result<MasterProfile, AuctionError>;

    /// Credits the master's wallet. `amount` must be positive. Appends a completed `Deposit` ledger row and
    /// increments the wallet balance atomically. Depositing settles nothing by itself; pending commissions are only
    /// settled through [`WalletManagement::pay_commission`] or [`WalletManagement::pay_all_pending`].
    async fn deposit(
        &self,
        master: &MasterId,
        amount: Money,
        method: &str,
        details: Option<String>,
    ) -> Result<WalletTransaction, AuctionError>;

    /// Settles a single pending commission transaction from the wallet, atomically:
    /// * fails with [`AuctionError::CommissionAlreadySettled`] if the transaction is not pending,
    /// * fails with [`AuctionError::InsufficientBalance`] if the wallet does not cover it (no rows change),
    /// * otherwise debits the wallet, appends a negative `CommissionPayment` ledger row, marks the commission
    ///   `Paid` with a settlement timestamp, and moves the amount from the profile's commission balance to its
    ///   total paid.
    async fn pay_commission(&self, master: &MasterId, commission_tx_id: i64)
        -> Result<CommissionTransaction, AuctionError>;

    /// Settles every pending commission for the master as one atomic batch. If the wallet cannot cover the sum, the
    /// call fails with [`AuctionError::InsufficientBalance`] naming the shortfall, and no transaction is touched.
    /// There is no partial payment.
    async fn pay_all_pending(&self, master: &MasterId) -> Result<BatchSettlement, AuctionError>;
}
