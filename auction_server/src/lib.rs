//! # Craft Auction Platform server
//!
//! The HTTP face of the auction engine. It is responsible for:
//! * Receiving new orders from the customer-facing intake service and opening their auctions.
//! * Serving the bidding protocol to masters and the bid board to customers.
//! * Driving the atomic accept-bid settlement and the wallet/commission endpoints.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Identity
//! Authentication happens upstream at the API gateway; requests arrive with the verified identity in headers. See
//! [auth](auth/index.html).

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
