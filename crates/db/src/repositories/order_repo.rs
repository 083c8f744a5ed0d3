//! Repository for the `orders` table.

use sqlx::PgPool;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::activity::{CreateOrder, OrderDetailRow, OrderRow};

const COLUMNS: &str =
    "id, agent_id, drink_id, mood, reason, paid_by, price_paid_micros, created_at";

/// Order columns joined with the receiving agent and the drink.
const DETAIL_SELECT: &str = "SELECT o.id, o.agent_id, o.drink_id, o.mood, o.reason, o.paid_by,
            o.price_paid_micros, o.created_at,
            a.name AS agent_name, a.avatar_url AS agent_avatar_url, a.status AS agent_status,
            d.name AS drink_name, d.emoji AS drink_emoji, d.drink_type,
            d.price_micros AS drink_price_micros, d.description AS drink_description,
            d.created_at AS drink_created_at
     FROM orders o
     JOIN agents a ON a.id = o.agent_id
     JOIN drinks d ON d.id = o.drink_id";

pub struct OrderRepo;

impl OrderRepo {
    pub async fn create(pool: &PgPool, input: &CreateOrder<'_>) -> Result<OrderRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (agent_id, drink_id, mood, reason, paid_by, price_paid_micros)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrderRow>(&query)
            .bind(input.agent_id)
            .bind(input.drink_id)
            .bind(input.mood)
            .bind(input.reason)
            .bind(input.paid_by)
            .bind(input.price_paid_micros)
            .fetch_one(pool)
            .await
    }

    /// Most recent orders across the bar, newest first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<OrderDetailRow>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} ORDER BY o.created_at DESC LIMIT $1");
        sqlx::query_as::<_, OrderDetailRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Most recent orders served to one agent, newest first.
    pub async fn list_recent_for_agent(
        pool: &PgPool,
        agent_id: DbId,
        limit: i64,
    ) -> Result<Vec<OrderDetailRow>, sqlx::Error> {
        let query =
            format!("{DETAIL_SELECT} WHERE o.agent_id = $1 ORDER BY o.created_at DESC LIMIT $2");
        sqlx::query_as::<_, OrderDetailRow>(&query)
            .bind(agent_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Total micro-USDC the agent has paid, gifts included.
    pub async fn sum_paid_by(pool: &PgPool, agent_id: DbId) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(price_paid_micros), 0)::BIGINT FROM orders WHERE paid_by = $1",
        )
        .bind(agent_id)
        .fetch_one(pool)
        .await?;
        Ok(total)
    }

    pub async fn count_since(pool: &PgPool, since: Timestamp) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
