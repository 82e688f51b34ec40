use cap_common::Money;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{MasterId, WalletTransaction, WalletTxType},
    traits::AuctionError,
};

const WALLET_TX_COLUMNS: &str = r#"
    id, master_id, amount, tx_type, commission_tx_id, method, details, status, created_at, completed_at
"#;

/// Appends a row to the wallet ledger. Rows are never mutated afterwards; the completion timestamp is stamped at
/// insertion since wallet mutations settle within the enclosing transaction.
pub async fn append_transaction(
    master: &MasterId,
    amount: Money,
    tx_type: WalletTxType,
    commission_tx_id: Option<i64>,
    method: Option<&str>,
    details: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<WalletTransaction, AuctionError> {
    let q = format!(
        r#"
        INSERT INTO wallet_transactions (master_id, amount, tx_type, commission_tx_id, method, details, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, CURRENT_TIMESTAMP)
        RETURNING {WALLET_TX_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, WalletTransaction>(&q)
        .bind(master)
        .bind(amount)
        .bind(tx_type.to_string())
        .bind(commission_tx_id)
        .bind(method)
        .bind(details)
        .fetch_one(conn)
        .await?;
    trace!("💰️ Wallet ledger row #{} for [{master}]: {amount} ({tx_type})", row.id);
    Ok(row)
}

/// The master's full wallet ledger, oldest first.
pub async fn history(master: &MasterId, conn: &mut SqliteConnection) -> Result<Vec<WalletTransaction>, AuctionError> {
    let q = format!("SELECT {WALLET_TX_COLUMNS} FROM wallet_transactions WHERE master_id = $1 ORDER BY id ASC");
    let rows = sqlx::query_as::<_, WalletTransaction>(&q).bind(master).fetch_all(conn).await?;
    Ok(rows)
}
