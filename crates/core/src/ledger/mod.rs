//! Balance-mutating operations: drink orders and social actions.
//!
//! Every ledger write is a compare-and-swap on the agent's `version`. When
//! another request gets there first, the operation re-reads the agent and
//! re-applies its rules (balance check, promotion eligibility) against the
//! fresh state, up to [`MAX_LEDGER_ATTEMPTS`] times.

pub mod order;
pub mod social;

use serde::Serialize;

use crate::agent::Agent;
use crate::drink::{Drink, DrinkType};
use crate::error::CoreError;
use crate::money::Usdc;
use crate::rate_limit::{persisted, RateCategory};
use crate::store::{AgentStore, LedgerUpdate, RateLimitStore};
use crate::types::{DbId, Timestamp};

pub use order::{place_order, OrderReceipt, OrderRequest};
pub use social::{perform_action, ActionOutcome, ActionRequest};

/// Compare-and-swap attempts before a ledger write gives up with a conflict.
pub const MAX_LEDGER_ATTEMPTS: usize = 3;

/// The most a beer may cost and still qualify as the free first drink.
pub const FREE_FIRST_DRINK_MAX_PRICE: Usdc = Usdc::from_cents(100);

pub const MOOD_MAX_CHARS: usize = 100;
pub const REASON_MAX_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// What an agent would pay for a drink right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// The first-drink promotion applies.
    pub free: bool,
    pub effective: Usdc,
}

/// Price `drink` for `agent`, applying the first-drink promotion.
pub fn quote(agent: &Agent, drink: &Drink) -> Quote {
    let free = !agent.first_drink_claimed
        && drink.drink_type == DrinkType::Beer
        && drink.price <= FREE_FIRST_DRINK_MAX_PRICE;
    Quote {
        free,
        effective: if free { Usdc::ZERO } else { drink.price },
    }
}

/// Details reported when an agent cannot afford something.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceShortfall {
    pub required: Usdc,
    pub current: Usdc,
    /// Set for the agent's own orders; absent when buying for someone else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_drink_available: Option<bool>,
}

impl BalanceShortfall {
    pub fn error_message(&self) -> &'static str {
        match self.first_drink_available {
            Some(_) => "Insufficient balance",
            None => "Insufficient balance to buy a drink",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self.first_drink_available {
            Some(true) => {
                "Your first beer is free! Order a beer instead, or deposit USDC to your wallet."
            }
            Some(false) => "Deposit USDC to your wallet to keep ordering.",
            None => "Top up your wallet before buying drinks for others.",
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Trim `input` to at most `max_chars` characters; empty input is absent.
pub fn clip(input: Option<&str>, max_chars: usize) -> Option<String> {
    let text: String = input?.chars().take(max_chars).collect();
    (!text.is_empty()).then_some(text)
}

/// Consume one request from the agent's bucket or fail with `RateLimited`.
pub async fn gate<S>(
    store: &S,
    agent_id: DbId,
    category: RateCategory,
    now: Timestamp,
) -> Result<(), CoreError>
where
    S: RateLimitStore + ?Sized,
{
    let decision = persisted::check(store, agent_id, category, now).await;
    if decision.allowed {
        Ok(())
    } else {
        Err(CoreError::RateLimited(decision))
    }
}

/// Apply a ledger change with optimistic concurrency.
///
/// `apply` computes the update from the agent as currently stored; it runs
/// again after every lost race. Returns the agent as written plus whatever
/// `apply` produced alongside the update.
pub(crate) async fn write_ledger<S, F, T>(
    store: &S,
    agent: &Agent,
    mut apply: F,
) -> Result<(Agent, T), CoreError>
where
    S: AgentStore + ?Sized,
    F: FnMut(&Agent) -> Result<(LedgerUpdate, T), CoreError>,
{
    let mut current = agent.clone();

    for attempt in 1..=MAX_LEDGER_ATTEMPTS {
        let (update, extra) = apply(&current)?;
        if let Some(written) = store
            .update_ledger(current.id, current.version, &update)
            .await?
        {
            return Ok((written, extra));
        }

        tracing::debug!(agent_id = %current.id, attempt, "Ledger version moved, re-reading agent");
        current = store
            .find_agent(current.id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Agent",
                id: agent.id,
            })?;
    }

    tracing::warn!(agent_id = %agent.id, "Ledger update kept losing races");
    Err(CoreError::Conflict(
        "Your balance changed while this request was processed. Please retry.".to_string(),
    ))
}
