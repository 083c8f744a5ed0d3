//! Repository for the `messages` table.

use sqlx::PgPool;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::activity::{CreateMessage, MessageDetailRow, MessageRow};

const COLUMNS: &str = "id, agent_id, content, message_type, reply_to, created_at";

pub struct MessageRepo;

impl MessageRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateMessage<'_>,
    ) -> Result<MessageRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (agent_id, content, message_type, reply_to)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MessageRow>(&query)
            .bind(input.agent_id)
            .bind(input.content)
            .bind(input.message_type)
            .bind(input.reply_to)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MessageRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        sqlx::query_as::<_, MessageRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A page of the feed with authors, newest first, optionally strictly
    /// older than `before`.
    pub async fn list_page(
        pool: &PgPool,
        limit: i64,
        before: Option<Timestamp>,
    ) -> Result<Vec<MessageDetailRow>, sqlx::Error> {
        sqlx::query_as::<_, MessageDetailRow>(
            "SELECT m.id, m.agent_id, m.content, m.message_type, m.reply_to, m.created_at,
                    a.name AS agent_name, a.avatar_url AS agent_avatar_url,
                    a.status AS agent_status
             FROM messages m
             JOIN agents a ON a.id = m.agent_id
             WHERE $2::TIMESTAMPTZ IS NULL OR m.created_at < $2
             ORDER BY m.created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .bind(before)
        .fetch_all(pool)
        .await
    }

    pub async fn count_since(pool: &PgPool, since: Timestamp) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE created_at >= $1")
                .bind(since)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
