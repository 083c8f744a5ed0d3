//! Append-only activity records: orders, interactions and chat messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agent::AgentSummary;
use crate::drink::Drink;
use crate::error::CoreError;
use crate::money::Usdc;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// A drink served to `agent_id`. For gifts `paid_by` is the buyer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: DbId,
    pub agent_id: DbId,
    pub drink_id: DbId,
    pub mood: Option<String>,
    pub reason: Option<String>,
    pub paid_by: DbId,
    #[serde(rename = "price_paid_usdc")]
    pub price_paid: Usdc,
    pub created_at: Timestamp,
}

/// An order joined with the drink and the agent it was served to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub agent: AgentSummary,
    pub drink: Drink,
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Cheers,
    HighFive,
    BuyDrink,
}

impl InteractionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            InteractionType::Cheers => "cheers",
            InteractionType::HighFive => "high_five",
            InteractionType::BuyDrink => "buy_drink",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cheers" => Ok(InteractionType::Cheers),
            "high_five" => Ok(InteractionType::HighFive),
            "buy_drink" => Ok(InteractionType::BuyDrink),
            _ => Err(CoreError::Validation(
                "Invalid action. Must be one of: cheers, high_five, buy_drink".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    pub id: DbId,
    pub from_agent: DbId,
    pub to_agent: DbId,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Chat,
    Toast,
    Vent,
    Brag,
    Philosophical,
}

impl MessageType {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageType::Chat => "chat",
            MessageType::Toast => "toast",
            MessageType::Vent => "vent",
            MessageType::Brag => "brag",
            MessageType::Philosophical => "philosophical",
        }
    }

    /// Parse a client-supplied type, falling back to [`MessageType::Chat`]
    /// for anything missing or unrecognised.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(MessageType::Chat),
            "toast" => Ok(MessageType::Toast),
            "vent" => Ok(MessageType::Vent),
            "brag" => Ok(MessageType::Brag),
            "philosophical" => Ok(MessageType::Philosophical),
            other => Err(CoreError::Validation(format!("unknown message type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: DbId,
    pub agent_id: DbId,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to: Option<DbId>,
    pub created_at: Timestamp,
}

/// A message joined with its author, as shown in the chat feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub message: Message,
    pub agent: AgentSummary,
}
