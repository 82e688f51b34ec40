//! # Backend contracts for the auction engine.
//!
//! This module defines the behaviour a storage backend must expose to act as the durable store behind the auction
//! engine. The engine itself never talks to a database directly; everything goes through these traits, so the flow
//! APIs can be exercised against any conforming implementation (the bundled SQLite backend, or an in-memory double
//! in tests).
//!
//! * [`AuctionDatabase`] owns every multi-row mutation of the order/bid/commission/wallet quartet. Implementations
//!   MUST run each of these operations inside a single atomic transaction: no partial state may ever become visible,
//!   and two concurrent `accept_bid` calls on the same order must never both succeed.
//! * [`WalletManagement`] owns the wallet ledger and commission settlement.
//! * [`MarketReader`] provides the read-only queries (listings, summaries, balances). These may run at relaxed
//!   isolation since they take no locks and make no decisions.

mod auction_database;
mod data_objects;
mod errors;
mod market_reader;
mod wallet_management;

pub use auction_database::AuctionDatabase;
pub use data_objects::{AcceptedBid, BatchSettlement, CompetitionSummary};
pub use errors::AuctionError;
pub use market_reader::MarketReader;
pub use wallet_management::WalletManagement;
