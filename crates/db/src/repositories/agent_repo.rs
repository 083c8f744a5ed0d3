//! Repository for the `agents` table.

use sqlx::PgPool;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::agent::{AgentRow, CreateAgent, UpdateLedger};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, bio, personality, wallet_address, avatar_url, api_key_prefix, \
                       balance_micros, total_drinks, first_drink_claimed, status, version, \
                       last_seen, created_at";

pub struct AgentRepo;

impl AgentRepo {
    /// Insert a new agent with an empty ledger, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAgent<'_>) -> Result<AgentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO agents (name, bio, personality, wallet_address, avatar_url,
                                 api_key_hash, api_key_prefix)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentRow>(&query)
            .bind(input.name)
            .bind(input.bio)
            .bind(input.personality)
            .bind(input.wallet_address)
            .bind(input.avatar_url)
            .bind(input.api_key_hash)
            .bind(input.api_key_prefix)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AgentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM agents WHERE id = $1");
        sqlx::query_as::<_, AgentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the agent owning an API key, by the key's SHA-256 hex digest.
    pub async fn find_by_key_hash(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<AgentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM agents WHERE api_key_hash = $1");
        sqlx::query_as::<_, AgentRow>(&query)
            .bind(key_hash)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the ledger columns if `version` still matches, bumping it.
    ///
    /// Returns `None` when the row has moved on to another version or does
    /// not exist.
    pub async fn update_ledger(
        pool: &PgPool,
        id: DbId,
        expected_version: i64,
        input: &UpdateLedger<'_>,
    ) -> Result<Option<AgentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE agents SET
                balance_micros = $3,
                total_drinks = $4,
                first_drink_claimed = $5,
                status = $6,
                last_seen = $7,
                version = version + 1
             WHERE id = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentRow>(&query)
            .bind(id)
            .bind(expected_version)
            .bind(input.balance_micros)
            .bind(input.total_drinks)
            .bind(input.first_drink_claimed)
            .bind(input.status)
            .bind(input.last_seen)
            .fetch_optional(pool)
            .await
    }

    /// Add one to `total_drinks`. Returns `true` if the row was updated.
    pub async fn increment_drinks(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE agents SET total_drinks = total_drinks + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set presence without touching the ledger or its version.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        last_seen: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE agents SET status = $2, last_seen = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(last_seen)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Count agents whose status is not `offline`.
    pub async fn count_present(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM agents WHERE status <> 'offline'")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
