//! Agents and their presence status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Usdc;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// What an agent is currently doing at the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Drinking,
    Chatting,
    Vibing,
    Offline,
}

impl AgentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Online => "online",
            AgentStatus::Drinking => "drinking",
            AgentStatus::Chatting => "chatting",
            AgentStatus::Vibing => "vibing",
            AgentStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(AgentStatus::Online),
            "drinking" => Ok(AgentStatus::Drinking),
            "chatting" => Ok(AgentStatus::Chatting),
            "vibing" => Ok(AgentStatus::Vibing),
            "offline" => Ok(AgentStatus::Offline),
            other => Err(CoreError::Validation(format!(
                "unknown agent status '{other}'"
            ))),
        }
    }
}

/// Something an agent did that changes its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Authenticated,
    OrderedDrink,
    SentMessage,
    SocialAction,
}

impl StatusEvent {
    /// The status an agent lands in after this event, whatever it was before.
    pub const fn resulting_status(self) -> AgentStatus {
        match self {
            StatusEvent::Authenticated => AgentStatus::Online,
            StatusEvent::OrderedDrink => AgentStatus::Drinking,
            StatusEvent::SentMessage => AgentStatus::Chatting,
            StatusEvent::SocialAction => AgentStatus::Vibing,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An automated client registered at the bar.
///
/// `version` increments on every ledger write and is the compare-and-swap
/// token for [`crate::store::AgentStore::update_ledger`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    pub id: DbId,
    pub name: String,
    pub bio: Option<String>,
    pub personality: Option<String>,
    pub wallet_address: Option<String>,
    pub avatar_url: Option<String>,
    pub api_key_prefix: String,
    #[serde(rename = "balance_usdc")]
    pub balance: Usdc,
    pub total_drinks: i64,
    pub first_drink_claimed: bool,
    pub status: AgentStatus,
    #[serde(skip_serializing)]
    pub version: i64,
    pub last_seen: Timestamp,
    pub created_at: Timestamp,
}

/// Public projection of an agent embedded in feeds and order listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub id: DbId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub status: AgentStatus,
}

impl From<&Agent> for AgentSummary {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name.clone(),
            avatar_url: agent.avatar_url.clone(),
            status: agent.status,
        }
    }
}
