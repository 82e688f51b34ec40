//! # Auction engine public API
//!
//! The `api` module exposes the programmatic surface of the auction engine. The APIs are modular: clients pick the
//! pieces they need, and each piece is generic over the backend trait it requires, so a different store (or a test
//! double) can be slotted in per API.
//!
//! * [`auction_flow_api`] drives the order lifecycle: bidding, the atomic accept-bid settlement, delivery
//!   transitions and cancellation.
//! * [`wallet_api`] drives the wallet ledger: deposits and commission settlement.
//! * [`market_api`] serves the read-only views: bid listings, anonymized competition summaries and commission
//!   previews.
//!
//! The usage pattern is the same everywhere: construct the API with a backend implementing the required trait.
//!
//! ```rust,ignore
//! use auction_engine::{commission::CommissionConfig, events::EventProducers, AuctionFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/cap_store.db", 25).await?;
//! let api = AuctionFlowApi::new(db, CommissionConfig::from_env_or_default(), EventProducers::default());
//! let accepted = api.accept_bid(bid_id, &customer).await?;
//! ```

pub mod auction_flow_api;
pub mod market_api;
pub mod wallet_api;

pub use auction_flow_api::AuctionFlowApi;
pub use market_api::MarketApi;
pub use wallet_api::WalletApi;
