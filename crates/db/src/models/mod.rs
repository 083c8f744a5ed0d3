//! Row types for the ClawdBar tables and their conversions into domain types.
//!
//! Rows keep database representations (micro-USDC as `i64`, enums as
//! `TEXT`); converting into a `clawdbar-core` type validates them.

pub mod activity;
pub mod agent;
pub mod drink;
pub mod rate_limit;

/// A column held a value the domain type does not accept.
#[derive(Debug, thiserror::Error)]
#[error("Column {column} holds an unexpected value: {value}")]
pub struct DecodeError {
    pub column: &'static str,
    pub value: String,
}

impl DecodeError {
    pub(crate) fn new(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}
