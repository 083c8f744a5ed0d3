//! Token bucket rows.

use sqlx::FromRow;
use clawdbar_core::rate_limit::BucketState;
use clawdbar_core::store::StoredBucket;
use clawdbar_core::types::{DbId, Timestamp};

/// An agent left-joined with its bucket for one category. The bucket
/// columns are `NULL` when the agent has no row for that category yet.
#[derive(Debug, Clone, FromRow)]
pub struct AgentBucketRow {
    pub agent_id: DbId,
    pub tokens: Option<f64>,
    pub last_request_at: Option<Timestamp>,
}

/// Interpret the lookup result; no row at all means the agent is unknown.
pub fn stored_bucket(row: Option<AgentBucketRow>) -> StoredBucket {
    match row {
        None => StoredBucket::UnknownAgent,
        Some(AgentBucketRow {
            tokens: Some(tokens),
            last_request_at: Some(last_update),
            ..
        }) => StoredBucket::Present(BucketState {
            tokens,
            last_update,
        }),
        Some(_) => StoredBucket::Empty,
    }
}
