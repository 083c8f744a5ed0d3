//! Repository for the `agent_rate_limits` table.

use sqlx::PgPool;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::rate_limit::AgentBucketRow;

pub struct RateLimitRepo;

impl RateLimitRepo {
    /// Look up an agent together with its bucket for `category`.
    ///
    /// `None` means the agent does not exist; a row with `NULL` bucket
    /// columns means the agent has no bucket for this category yet.
    pub async fn find_for_agent(
        pool: &PgPool,
        agent_id: DbId,
        category: &str,
    ) -> Result<Option<AgentBucketRow>, sqlx::Error> {
        sqlx::query_as::<_, AgentBucketRow>(
            "SELECT a.id AS agent_id, r.tokens, r.last_request_at
             FROM agents a
             LEFT JOIN agent_rate_limits r
                    ON r.agent_id = a.id AND r.category = $2
             WHERE a.id = $1",
        )
        .bind(agent_id)
        .bind(category)
        .fetch_optional(pool)
        .await
    }

    /// Create the first bucket for `(agent_id, category)`.
    ///
    /// Returns `false` if another request created it first.
    pub async fn insert(
        pool: &PgPool,
        agent_id: DbId,
        category: &str,
        tokens: f64,
        last_request_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO agent_rate_limits (agent_id, category, tokens, last_request_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (agent_id, category) DO NOTHING",
        )
        .bind(agent_id)
        .bind(category)
        .bind(tokens)
        .bind(last_request_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace a bucket only if it still holds the state that was read.
    ///
    /// Returns `false` if another request changed it in between.
    #[allow(clippy::too_many_arguments)]
    pub async fn compare_and_swap(
        pool: &PgPool,
        agent_id: DbId,
        category: &str,
        expected_tokens: f64,
        expected_last_request_at: Timestamp,
        tokens: f64,
        last_request_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE agent_rate_limits
             SET tokens = $5, last_request_at = $6
             WHERE agent_id = $1 AND category = $2
               AND tokens = $3 AND last_request_at = $4",
        )
        .bind(agent_id)
        .bind(category)
        .bind(expected_tokens)
        .bind(expected_last_request_at)
        .bind(tokens)
        .bind(last_request_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
