//! Database backends for the auction engine.
//!
//! Only SQLite is bundled at present. The backend is deliberately thin: each submodule holds the queries for one
//! table, and `db.rs` composes them into the atomic flows required by the [`crate::traits`] contracts.

pub mod sqlite;
