//! Order, interaction and message rows, plus the joined feed rows.

use sqlx::FromRow;
use clawdbar_core::activity::{
    Interaction, Message, MessageDetail, MessageType, Order, OrderDetail,
};
use clawdbar_core::drink::Drink;
use clawdbar_core::money::Usdc;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::agent::summary;
use crate::models::DecodeError;

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: DbId,
    pub agent_id: DbId,
    pub drink_id: DbId,
    pub mood: Option<String>,
    pub reason: Option<String>,
    pub paid_by: DbId,
    pub price_paid_micros: i64,
    pub created_at: Timestamp,
}

/// Insert DTO for the `orders` table.
#[derive(Debug, Clone)]
pub struct CreateOrder<'a> {
    pub agent_id: DbId,
    pub drink_id: DbId,
    pub mood: Option<&'a str>,
    pub reason: Option<&'a str>,
    pub paid_by: DbId,
    pub price_paid_micros: i64,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            agent_id: row.agent_id,
            drink_id: row.drink_id,
            mood: row.mood,
            reason: row.reason,
            paid_by: row.paid_by,
            price_paid: Usdc::from_micros(row.price_paid_micros),
            created_at: row.created_at,
        }
    }
}

/// An order joined with the receiving agent and the drink.
#[derive(Debug, Clone, FromRow)]
pub struct OrderDetailRow {
    #[sqlx(flatten)]
    pub order: OrderRow,
    pub agent_name: String,
    pub agent_avatar_url: Option<String>,
    pub agent_status: String,
    pub drink_name: String,
    pub drink_emoji: String,
    pub drink_type: String,
    pub drink_price_micros: i64,
    pub drink_description: Option<String>,
    pub drink_created_at: Timestamp,
}

impl TryFrom<OrderDetailRow> for OrderDetail {
    type Error = DecodeError;

    fn try_from(row: OrderDetailRow) -> Result<Self, Self::Error> {
        let agent = summary(
            row.order.agent_id,
            row.agent_name,
            row.agent_avatar_url,
            &row.agent_status,
        )?;
        let drink = Drink {
            id: row.order.drink_id,
            name: row.drink_name,
            emoji: row.drink_emoji,
            drink_type: row
                .drink_type
                .parse()
                .map_err(|_| DecodeError::new("drinks.drink_type", &row.drink_type))?,
            price: Usdc::from_micros(row.drink_price_micros),
            description: row.drink_description,
            created_at: row.drink_created_at,
        };
        Ok(OrderDetail {
            order: row.order.into(),
            agent,
            drink,
        })
    }
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct InteractionRow {
    pub id: DbId,
    pub from_agent: DbId,
    pub to_agent: DbId,
    pub interaction_type: String,
    pub created_at: Timestamp,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = DecodeError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        Ok(Interaction {
            interaction_type: row.interaction_type.parse().map_err(|_| {
                DecodeError::new("interactions.interaction_type", &row.interaction_type)
            })?,
            id: row.id,
            from_agent: row.from_agent,
            to_agent: row.to_agent,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: DbId,
    pub agent_id: DbId,
    pub content: String,
    pub message_type: String,
    pub reply_to: Option<DbId>,
    pub created_at: Timestamp,
}

impl TryFrom<MessageRow> for Message {
    type Error = DecodeError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let message_type: MessageType = row
            .message_type
            .parse()
            .map_err(|_| DecodeError::new("messages.message_type", &row.message_type))?;
        Ok(Message {
            id: row.id,
            agent_id: row.agent_id,
            content: row.content,
            message_type,
            reply_to: row.reply_to,
            created_at: row.created_at,
        })
    }
}

/// Insert DTO for the `messages` table.
#[derive(Debug, Clone)]
pub struct CreateMessage<'a> {
    pub agent_id: DbId,
    pub content: &'a str,
    pub message_type: &'a str,
    pub reply_to: Option<DbId>,
}

/// A message joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct MessageDetailRow {
    #[sqlx(flatten)]
    pub message: MessageRow,
    pub agent_name: String,
    pub agent_avatar_url: Option<String>,
    pub agent_status: String,
}

impl TryFrom<MessageDetailRow> for MessageDetail {
    type Error = DecodeError;

    fn try_from(row: MessageDetailRow) -> Result<Self, Self::Error> {
        let agent = summary(
            row.message.agent_id,
            row.agent_name,
            row.agent_avatar_url,
            &row.agent_status,
        )?;
        Ok(MessageDetail {
            message: row.message.try_into()?,
            agent,
        })
    }
}
