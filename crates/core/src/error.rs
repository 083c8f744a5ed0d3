use crate::ledger::BalanceShortfall;
use crate::rate_limit::RateLimitDecision;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{}", .0.error_message())]
    InsufficientBalance(BalanceShortfall),

    #[error("{}", .0.error.as_deref().unwrap_or("Rate limit exceeded"))]
    RateLimited(RateLimitDecision),

    #[error("No drinks available")]
    NoDrinksAvailable,

    #[error("Internal error: {0}")]
    Internal(String),
}
