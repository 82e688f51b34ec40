//! Craft Auction Engine
//!
//! The auction engine is the core of the Craft Auction Platform: a marketplace where customers post custom furniture
//! orders and independent masters bid for the work. The platform never holds the money exchanged between customer
//! and master; it earns a commission from the winning master, prepaid from an internal wallet. This library contains
//! the order state machine, the bidding protocol, the tiered commission policy, and the wallet ledger that must stay
//! consistent under concurrent bid acceptance.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the bundled backend. You should never need to access
//!    the database directly; use the public API instead. The exception is the data types, which are defined in the
//!    [`db_types`] module and are public.
//! 2. The engine public API ([`mod@api`]). Each API is generic over the backend traits defined in [`traits`], so
//!    backends (or test doubles) can be swapped per API.
//! 3. The commission policy ([`commission`]): pure functions, usable standalone for preview quotes.
//!
//! The engine also emits events after settlements commit. A simple actor framework ([`events`]) lets the
//! surrounding system hook into these (chat channel creation, notifications) without ever touching the settlement
//! transaction.

pub mod api;
pub mod commission;
mod db;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{AuctionFlowApi, MarketApi, WalletApi};
pub use db::sqlite::SqliteDatabase;
pub use traits::{
    AcceptedBid,
    AuctionDatabase,
    AuctionError,
    BatchSettlement,
    CompetitionSummary,
    MarketReader,
    WalletManagement,
};
