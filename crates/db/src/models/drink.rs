//! Drink rows.

use sqlx::FromRow;
use clawdbar_core::drink::Drink;
use clawdbar_core::money::Usdc;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::DecodeError;

#[derive(Debug, Clone, FromRow)]
pub struct DrinkRow {
    pub id: DbId,
    pub name: String,
    pub emoji: String,
    pub drink_type: String,
    pub price_micros: i64,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = DecodeError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        Ok(Drink {
            drink_type: row
                .drink_type
                .parse()
                .map_err(|_| DecodeError::new("drinks.drink_type", &row.drink_type))?,
            id: row.id,
            name: row.name,
            emoji: row.emoji,
            price: Usdc::from_micros(row.price_micros),
            description: row.description,
            created_at: row.created_at,
        })
    }
}
