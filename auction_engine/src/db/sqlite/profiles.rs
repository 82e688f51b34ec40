use cap_common::Money;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{MasterId, MasterProfile},
    traits::AuctionError,
};

const PROFILE_COLUMNS: &str = r#"
    id, master_id, enrolled_at, first_month_orders, commission_balance, total_commission_paid,
    wallet_balance, created_at, updated_at
"#;

pub async fn fetch_profile(
    master: &MasterId,
    conn: &mut SqliteConnection,
) -> Result<Option<MasterProfile>, AuctionError> {
    let q = format!("SELECT {PROFILE_COLUMNS} FROM master_profiles WHERE master_id = $1");
    let profile = sqlx::query_as::<_, MasterProfile>(&q).bind(master).fetch_optional(conn).await?;
    Ok(profile)
}

/// Fetches the commission profile for the master, creating a fresh one if none exists. Creation is keyed on the
/// unique `master_id`, so a concurrent create resolves to the same row.
pub async fn fetch_or_create_profile(
    master: &MasterId,
    conn: &mut SqliteConnection,
) -> Result<MasterProfile, AuctionError> {
    if let Some(profile) = fetch_profile(master, &mut *conn).await? {
        return Ok(profile);
    }
    sqlx::query("INSERT INTO master_profiles (master_id) VALUES ($1) ON CONFLICT (master_id) DO NOTHING")
        .bind(master)
        .execute(&mut *conn)
        .await?;
    debug!("🧑️ Created commission profile for master [{master}]");
    let profile = fetch_profile(master, conn)
        .await?
        .ok_or_else(|| AuctionError::SettlementFailed(format!("Profile for [{master}] vanished after creation")))?;
    Ok(profile)
}

/// Applies deltas to the three running totals on the profile in one statement. Positive deltas credit, negative
/// debit. The `wallet_balance >= 0` schema check backstops the engine-level balance guards.
pub async fn adjust_balances(
    master: &MasterId,
    wallet_delta: Money,
    commission_delta: Money,
    paid_delta: Money,
    conn: &mut SqliteConnection,
) -> Result<(), AuctionError> {
    sqlx::query(
        r#"UPDATE master_profiles SET
           wallet_balance = wallet_balance + $1,
           commission_balance = commission_balance + $2,
           total_commission_paid = total_commission_paid + $3,
           updated_at = CURRENT_TIMESTAMP
           WHERE master_id = $4"#,
    )
    .bind(wallet_delta.value())
    .bind(commission_delta.value())
    .bind(paid_delta.value())
    .bind(master)
    .execute(conn)
    .await?;
    Ok(())
}

/// Bumps the count of orders billed under the first-month tier.
pub async fn incr_first_month_orders(master: &MasterId, conn: &mut SqliteConnection) -> Result<(), AuctionError> {
    sqlx::query(
        r#"UPDATE master_profiles SET
           first_month_orders = first_month_orders + 1,
           updated_at = CURRENT_TIMESTAMP
           WHERE master_id = $1"#,
    )
    .bind(master)
    .execute(conn)
    .await?;
    Ok(())
}
