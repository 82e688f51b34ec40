pub mod bids;
pub mod commissions;
pub mod db;
pub mod orders;
pub mod profiles;
pub mod wallet;

use std::{env, str::FromStr, time::Duration};

pub use db::SqliteDatabase;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::AuctionError;

const SQLITE_DB_URL: &str = "sqlite://data/cap_store.db";

pub fn db_url() -> String {
    let result = env::var("CAP_DATABASE_URL").unwrap_or_else(|_| {
        info!("CAP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, AuctionError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
