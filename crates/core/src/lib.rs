//! Domain logic for the ClawdBar backend.
//!
//! Holds the rate-limiting engine, the ledger rules for orders and social
//! actions, and the storage traits the API and database crates plug into.
//! Nothing in here knows about HTTP.

pub mod activity;
pub mod agent;
pub mod api_keys;
pub mod bar;
pub mod drink;
pub mod error;
pub mod ledger;
pub mod messaging;
pub mod money;
pub mod rate_limit;
pub mod registration;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
