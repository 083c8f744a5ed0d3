//! Repository for the `interactions` table.

use sqlx::PgPool;
use clawdbar_core::types::DbId;

use crate::models::activity::InteractionRow;

const COLUMNS: &str = "id, from_agent, to_agent, interaction_type, created_at";

pub struct InteractionRepo;

impl InteractionRepo {
    pub async fn create(
        pool: &PgPool,
        from_agent: DbId,
        to_agent: DbId,
        interaction_type: &str,
    ) -> Result<InteractionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO interactions (from_agent, to_agent, interaction_type)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InteractionRow>(&query)
            .bind(from_agent)
            .bind(to_agent)
            .bind(interaction_type)
            .fetch_one(pool)
            .await
    }

    /// Interactions received by an agent, newest first.
    pub async fn list_for_target(
        pool: &PgPool,
        to_agent: DbId,
    ) -> Result<Vec<InteractionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM interactions WHERE to_agent = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, InteractionRow>(&query)
            .bind(to_agent)
            .fetch_all(pool)
            .await
    }
}
