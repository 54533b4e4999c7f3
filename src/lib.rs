//! covcache library
//!
//! Backend aggregator for a Korean COVID companion app: fetches third-party
//! datasets (city weather, pandemic news, infection statistics, vaccination
//! centers), caches each one in a local document store under a TTL, and
//! serves consistent single-snapshot reads.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod store;
