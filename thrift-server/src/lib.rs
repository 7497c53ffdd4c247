//! Hokies Thrift storefront server
//!
//! Inventory, timed drops, seller consignment and checkout behind one
//! HTTP API, backed by SQLite.

pub mod api;
pub mod checkout;
pub mod core;
pub mod db;
pub mod drops;
pub mod providers;
pub mod submissions;
pub mod utils;
