//! Helpers for preparing throwaway databases and fixture data in tests.

use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{CustomerId, MasterId, NewBid, NewOrder, OrderId},
    SqliteDatabase,
};

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir().join(format!("cap_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", dir.display())
}

pub async fn run_migrations(url: &str) -> SqliteDatabase {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub fn seed_order(n: u32) -> NewOrder {
    NewOrder::new(
        OrderId::from(format!("order-{n}")),
        CustomerId::from(format!("customer-{n}")),
        format!("Oak dining table #{n}"),
    )
    .with_description("Six seats, natural finish")
}

pub fn seed_bid(order: &OrderId, master: &str, price: i64, days: i64) -> NewBid {
    NewBid::new(order.clone(), MasterId::from(master), price.into(), days)
}

/// Plants a pending commission debt directly in the store. The debt gate normally stops a master from accumulating
/// more than one, so multi-debt scenarios have to be seeded rather than driven through the bidding flow.
/// Returns the commission transaction id.
pub async fn seed_pending_commission(db: &SqliteDatabase, master: &str, order_no: u32, amount: i64) -> i64 {
    use crate::traits::{AuctionDatabase, WalletManagement};
    let order = db.insert_order(seed_order(order_no)).await.expect("Error seeding order");
    let master_id = MasterId::from(master);
    db.fetch_or_create_profile(&master_id).await.expect("Error seeding master profile");
    let id = sqlx::query(
        r#"INSERT INTO commission_transactions (master_id, order_id, order_amount, commission_amount, tier, status)
           VALUES ($1, $2, $3, $4, 'FirstMonth', 'Pending')"#,
    )
    .bind(master_id.as_str())
    .bind(order.order_id.as_str())
    .bind(amount * 20)
    .bind(amount)
    .execute(db.pool())
    .await
    .expect("Error seeding commission transaction")
    .last_insert_rowid();
    sqlx::query("UPDATE master_profiles SET commission_balance = commission_balance + $1 WHERE master_id = $2")
        .bind(amount)
        .bind(master_id.as_str())
        .execute(db.pool())
        .await
        .expect("Error seeding commission balance");
    id
}
