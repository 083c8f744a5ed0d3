//! Repository for the `drinks` table.

use sqlx::PgPool;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::drink::DrinkRow;

const COLUMNS: &str = "id, name, emoji, drink_type, price_micros, description, created_at";

pub struct DrinkRepo;

impl DrinkRepo {
    /// The whole menu, cheapest first. Ties break on name for a stable order.
    pub async fn list(pool: &PgPool) -> Result<Vec<DrinkRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drinks ORDER BY price_micros ASC, name ASC");
        sqlx::query_as::<_, DrinkRow>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DrinkRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drinks WHERE id = $1");
        sqlx::query_as::<_, DrinkRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_cheapest(pool: &PgPool) -> Result<Option<DrinkRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM drinks ORDER BY price_micros ASC, name ASC LIMIT 1"
        );
        sqlx::query_as::<_, DrinkRow>(&query)
            .fetch_optional(pool)
            .await
    }

    /// The drink with the most orders since `since`.
    pub async fn find_most_ordered_since(
        pool: &PgPool,
        since: Timestamp,
    ) -> Result<Option<DrinkRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM drinks
             WHERE id = (
                 SELECT o.drink_id FROM orders o
                 JOIN drinks d ON d.id = o.drink_id
                 WHERE o.created_at >= $1
                 GROUP BY o.drink_id, d.price_micros, d.name
                 ORDER BY COUNT(*) DESC, d.price_micros ASC, d.name ASC
                 LIMIT 1
             )"
        );
        sqlx::query_as::<_, DrinkRow>(&query)
            .bind(since)
            .fetch_optional(pool)
            .await
    }
}
