//! Agent rows.

use sqlx::FromRow;
use clawdbar_core::agent::{Agent, AgentStatus, AgentSummary};
use clawdbar_core::money::Usdc;
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::DecodeError;

/// Full row from the `agents` table, minus the key hash.
#[derive(Debug, Clone, FromRow)]
pub struct AgentRow {
    pub id: DbId,
    pub name: String,
    pub bio: Option<String>,
    pub personality: Option<String>,
    pub wallet_address: Option<String>,
    pub avatar_url: Option<String>,
    pub api_key_prefix: String,
    pub balance_micros: i64,
    pub total_drinks: i64,
    pub first_drink_claimed: bool,
    pub status: String,
    pub version: i64,
    pub last_seen: Timestamp,
    pub created_at: Timestamp,
}

impl TryFrom<AgentRow> for Agent {
    type Error = DecodeError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        Ok(Agent {
            status: parse_status(&row.status)?,
            id: row.id,
            name: row.name,
            bio: row.bio,
            personality: row.personality,
            wallet_address: row.wallet_address,
            avatar_url: row.avatar_url,
            api_key_prefix: row.api_key_prefix,
            balance: Usdc::from_micros(row.balance_micros),
            total_drinks: row.total_drinks,
            first_drink_claimed: row.first_drink_claimed,
            version: row.version,
            last_seen: row.last_seen,
            created_at: row.created_at,
        })
    }
}

/// Insert DTO for the `agents` table.
#[derive(Debug, Clone)]
pub struct CreateAgent<'a> {
    pub name: &'a str,
    pub bio: Option<&'a str>,
    pub personality: Option<&'a str>,
    pub wallet_address: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub api_key_hash: &'a str,
    pub api_key_prefix: &'a str,
}

/// Ledger columns written by a versioned update.
#[derive(Debug, Clone)]
pub struct UpdateLedger<'a> {
    pub balance_micros: i64,
    pub total_drinks: i64,
    pub first_drink_claimed: bool,
    pub status: &'a str,
    pub last_seen: Timestamp,
}

pub(crate) fn parse_status(raw: &str) -> Result<AgentStatus, DecodeError> {
    raw.parse().map_err(|_| DecodeError::new("agents.status", raw))
}

/// Build the embedded author/recipient summary from joined columns.
pub(crate) fn summary(
    id: DbId,
    name: String,
    avatar_url: Option<String>,
    status: &str,
) -> Result<AgentSummary, DecodeError> {
    Ok(AgentSummary {
        id,
        name,
        avatar_url,
        status: parse_status(status)?,
    })
}
