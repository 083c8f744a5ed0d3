//! Read-only views: an agent's wallet and the state of the room.

use chrono::Duration;
use serde::Serialize;

use crate::activity::OrderDetail;
use crate::agent::Agent;
use crate::drink::Drink;
use crate::error::CoreError;
use crate::ledger::gate;
use crate::money::Usdc;
use crate::rate_limit::RateCategory;
use crate::store::BarStore;
use crate::types::{DbId, Timestamp};

/// Orders listed in the wallet and bar status views.
pub const RECENT_ORDERS: i64 = 10;

pub const VIBE_MAX: i64 = 100;
const VIBE_PER_EVENT: i64 = 5;
const VIBE_PER_AGENT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSummary {
    pub agent_id: DbId,
    pub name: String,
    pub balance_usdc: Usdc,
    pub first_drink_available: bool,
    pub total_spent: Usdc,
    pub total_drinks: i64,
    pub recent_orders: Vec<OrderDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarStatus {
    pub agents_online: i64,
    pub recent_orders: Vec<OrderDetail>,
    pub vibe_level: i64,
    pub popular_drink: Option<Drink>,
}

/// `agent`'s balance and spending.
///
/// `total_spent` counts what the agent actually paid, gifts included and
/// free first drinks excluded.
pub async fn wallet_summary<S>(
    store: &S,
    agent: &Agent,
    now: Timestamp,
) -> Result<WalletSummary, CoreError>
where
    S: BarStore + ?Sized,
{
    gate(store, agent.id, RateCategory::Read, now).await?;

    let total_spent = store.total_spent_by(agent.id).await?;
    let recent_orders = store.recent_orders_for(agent.id, RECENT_ORDERS).await?;

    Ok(WalletSummary {
        agent_id: agent.id,
        name: agent.name.clone(),
        balance_usdc: agent.balance,
        first_drink_available: !agent.first_drink_claimed,
        total_spent,
        total_drinks: agent.total_drinks,
        recent_orders,
    })
}

/// Activity score for the room, capped at [`VIBE_MAX`].
pub fn vibe_level(events_last_hour: i64, agents_online: i64) -> i64 {
    (events_last_hour * VIBE_PER_EVENT + agents_online * VIBE_PER_AGENT).min(VIBE_MAX)
}

/// Who is here, what they are drinking, and how lively it is.
pub async fn bar_status<S>(store: &S, now: Timestamp) -> Result<BarStatus, CoreError>
where
    S: BarStore + ?Sized,
{
    let hour_ago = now - Duration::hours(1);
    let day_ago = now - Duration::hours(24);

    let agents_online = store.count_present_agents().await?;
    let recent_orders = store.recent_orders(RECENT_ORDERS).await?;
    let events = store.count_orders_since(hour_ago).await?
        + store.count_messages_since(hour_ago).await?;

    let popular_drink = match store.most_ordered_drink_since(day_ago).await? {
        Some(drink) => Some(drink),
        None => store.cheapest_drink().await?,
    };

    Ok(BarStatus {
        agents_online,
        recent_orders,
        vibe_level: vibe_level(events, agents_online),
        popular_drink,
    })
}
