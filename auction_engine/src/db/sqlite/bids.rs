use cap_common::Money;
use log::trace;
use sqlx::{Row, SqliteConnection};

use crate::{
    db_types::{Bid, BidStatusType, NewBid, OrderId},
    traits::{AuctionError, CompetitionSummary},
};

const BID_COLUMNS: &str = "id, order_id, master_id, price, days, note, status, created_at, updated_at";

pub async fn fetch_bid(bid_id: i64, conn: &mut SqliteConnection) -> Result<Option<Bid>, AuctionError> {
    let q = format!("SELECT {BID_COLUMNS} FROM bids WHERE id = $1");
    let bid = sqlx::query_as::<_, Bid>(&q).bind(bid_id).fetch_optional(conn).await?;
    Ok(bid)
}

/// Inserts the master's bid, or overwrites their existing bid on this order in place. The (order, master) pair is
/// unique; resubmitting replaces price, days and note, and resets the status to `Pending`.
pub async fn upsert_bid(bid: NewBid, conn: &mut SqliteConnection) -> Result<Bid, AuctionError> {
    let q = format!(
        r#"
        INSERT INTO bids (order_id, master_id, price, days, note)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (order_id, master_id) DO UPDATE SET
            price = excluded.price,
            days = excluded.days,
            note = excluded.note,
            status = 'Pending',
            updated_at = CURRENT_TIMESTAMP
        RETURNING {BID_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Bid>(&q)
        .bind(bid.order_id.as_str())
        .bind(&bid.master_id)
        .bind(bid.price)
        .bind(bid.days)
        .bind(&bid.note)
        .fetch_one(conn)
        .await?;
    trace!("🔨️ Bid #{} by [{}] on order {} recorded at {}", row.id, row.master_id, row.order_id, row.price);
    Ok(row)
}

pub async fn delete_bid(bid_id: i64, conn: &mut SqliteConnection) -> Result<(), AuctionError> {
    sqlx::query("DELETE FROM bids WHERE id = $1").bind(bid_id).execute(conn).await?;
    Ok(())
}

pub async fn set_bid_status(
    bid_id: i64,
    status: BidStatusType,
    conn: &mut SqliteConnection,
) -> Result<(), AuctionError> {
    let status = status.to_string();
    sqlx::query("UPDATE bids SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(bid_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Rejects every pending bid on the order except `winning_bid_id`. Called in the same transaction that accepts the
/// winner, so all siblings flip at the same instant.
pub async fn reject_competing_bids(
    order_id: &OrderId,
    winning_bid_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, AuctionError> {
    let result = sqlx::query(
        r#"UPDATE bids SET status = 'Rejected', updated_at = CURRENT_TIMESTAMP
           WHERE order_id = $1 AND id != $2 AND status = 'Pending'"#,
    )
    .bind(order_id.as_str())
    .bind(winning_bid_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Rejects every pending bid on the order. Used when an order is cancelled out of the auction state.
pub async fn reject_all_pending(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<u64, AuctionError> {
    let result = sqlx::query(
        r#"UPDATE bids SET status = 'Rejected', updated_at = CURRENT_TIMESTAMP
           WHERE order_id = $1 AND status = 'Pending'"#,
    )
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// All bids for the order, cheapest first, ties broken by earliest submission.
pub async fn bids_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<Bid>, AuctionError> {
    let q = format!("SELECT {BID_COLUMNS} FROM bids WHERE order_id = $1 ORDER BY price ASC, created_at ASC, id ASC");
    let bids = sqlx::query_as::<_, Bid>(&q).bind(order_id.as_str()).fetch_all(conn).await?;
    Ok(bids)
}

/// Aggregates the pending bids on the order without exposing any master identity.
pub async fn competition_summary(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<CompetitionSummary, AuctionError> {
    let row = sqlx::query(
        r#"SELECT
             COUNT(*) AS bid_count,
             MIN(price) AS min_price,
             MAX(price) AS max_price,
             CAST(ROUND(AVG(price)) AS INTEGER) AS avg_price
           FROM bids WHERE order_id = $1 AND status = 'Pending'"#,
    )
    .bind(order_id.as_str())
    .fetch_one(conn)
    .await?;
    let summary = CompetitionSummary {
        bid_count: row.try_get("bid_count")?,
        min_price: row.try_get::<Option<Money>, _>("min_price")?,
        max_price: row.try_get::<Option<Money>, _>("max_price")?,
        avg_price: row.try_get::<Option<Money>, _>("avg_price")?,
    };
    Ok(summary)
}
