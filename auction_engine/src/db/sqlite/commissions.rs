use cap_common::Money;
use log::trace;
use sqlx::{Row, SqliteConnection};

use crate::{
    commission::CommissionQuote,
    db_types::{CommissionStatus, CommissionTransaction, MasterId, OrderId},
    traits::AuctionError,
};

const COMMISSION_COLUMNS: &str = r#"
    id, master_id, order_id, order_amount, commission_amount, tier, rate, status, created_at, paid_at
"#;

/// Records the commission obligation for a won order. Created exactly once per (master, order) pair; the UNIQUE
/// constraint on `order_id` makes a double insert impossible. A commission inserted as `Paid` is stamped with its
/// settlement time immediately.
pub async fn insert_commission(
    master: &MasterId,
    order_id: &OrderId,
    order_amount: Money,
    quote: &CommissionQuote,
    status: CommissionStatus,
    conn: &mut SqliteConnection,
) -> Result<CommissionTransaction, AuctionError> {
    let q = format!(
        r#"
        INSERT INTO commission_transactions (master_id, order_id, order_amount, commission_amount, tier, rate, status, paid_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7 = 'Paid' THEN CURRENT_TIMESTAMP END)
        RETURNING {COMMISSION_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, CommissionTransaction>(&q)
        .bind(master)
        .bind(order_id.as_str())
        .bind(order_amount)
        .bind(quote.amount)
        .bind(quote.tier.to_string())
        .bind(quote.rate)
        .bind(status.to_string())
        .fetch_one(conn)
        .await?;
    trace!("🧾️ Commission #{} of {} recorded for [{}] on order {} ({})", row.id, row.commission_amount, master, order_id, status);
    Ok(row)
}

pub async fn fetch_commission(
    tx_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CommissionTransaction>, AuctionError> {
    let q = format!("SELECT {COMMISSION_COLUMNS} FROM commission_transactions WHERE id = $1");
    let row = sqlx::query_as::<_, CommissionTransaction>(&q).bind(tx_id).fetch_optional(conn).await?;
    Ok(row)
}

pub async fn fetch_commission_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<CommissionTransaction>, AuctionError> {
    let q = format!("SELECT {COMMISSION_COLUMNS} FROM commission_transactions WHERE order_id = $1");
    let row = sqlx::query_as::<_, CommissionTransaction>(&q).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(row)
}

/// The master's pending commission transactions, oldest first.
pub async fn pending_for_master(
    master: &MasterId,
    conn: &mut SqliteConnection,
) -> Result<Vec<CommissionTransaction>, AuctionError> {
    let q = format!(
        "SELECT {COMMISSION_COLUMNS} FROM commission_transactions WHERE master_id = $1 AND status = 'Pending' ORDER \
         BY id ASC"
    );
    let rows = sqlx::query_as::<_, CommissionTransaction>(&q).bind(master).fetch_all(conn).await?;
    Ok(rows)
}

/// The sum of the master's pending commission amounts. This is the debt that blocks new bids and wins.
pub async fn pending_total(master: &MasterId, conn: &mut SqliteConnection) -> Result<Money, AuctionError> {
    let row = sqlx::query(
        "SELECT COALESCE(SUM(commission_amount), 0) AS owed FROM commission_transactions WHERE master_id = $1 AND \
         status = 'Pending'",
    )
    .bind(master)
    .fetch_one(conn)
    .await?;
    let owed: i64 = row.try_get("owed")?;
    Ok(Money::from(owed))
}

/// Transitions a pending commission to `Paid` and stamps the settlement time.
pub async fn mark_paid(tx_id: i64, conn: &mut SqliteConnection) -> Result<(), AuctionError> {
    sqlx::query(
        "UPDATE commission_transactions SET status = 'Paid', paid_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = \
         'Pending'",
    )
    .bind(tx_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Transitions a pending commission to `Cancelled`. Paid commissions are never cancelled here.
pub async fn mark_cancelled(tx_id: i64, conn: &mut SqliteConnection) -> Result<(), AuctionError> {
    sqlx::query("UPDATE commission_transactions SET status = 'Cancelled' WHERE id = $1 AND status = 'Pending'")
        .bind(tx_id)
        .execute(conn)
        .await?;
    Ok(())
}
