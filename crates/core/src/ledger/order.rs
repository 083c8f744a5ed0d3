//! Ordering a drink for yourself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{Agent, StatusEvent};
use crate::drink::Drink;
use crate::error::CoreError;
use crate::ledger::{
    clip, gate, quote, write_ledger, BalanceShortfall, MOOD_MAX_CHARS, REASON_MAX_CHARS,
};
use crate::money::Usdc;
use crate::rate_limit::RateCategory;
use crate::store::{BarStore, LedgerUpdate, NewOrder};
use crate::types::{DbId, Timestamp};

/// Body of `POST /api/drinks/order`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderRequest {
    pub drink_id: Option<String>,
    pub mood: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReceipt {
    pub order_id: DbId,
    pub drink: Drink,
    pub balance_remaining: Usdc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_drink_promotion: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Serve `agent` the requested drink and charge for it.
///
/// The debit and the order row are separate writes. If the order insert
/// fails after the debit landed, the error is logged and surfaced as
/// internal; nothing is rolled back.
pub async fn place_order<S>(
    store: &S,
    agent: &Agent,
    request: &OrderRequest,
    now: Timestamp,
) -> Result<OrderReceipt, CoreError>
where
    S: BarStore + ?Sized,
{
    gate(store, agent.id, RateCategory::Order, now).await?;

    let drink_id = parse_drink_id(request.drink_id.as_deref())?;
    let drink = store
        .find_drink(drink_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Drink",
            id: drink_id,
        })?;

    let (updated, q) = write_ledger(store, agent, |current| {
        let q = quote(current, &drink);
        if !q.free && current.balance < drink.price {
            return Err(CoreError::InsufficientBalance(BalanceShortfall {
                required: drink.price,
                current: current.balance,
                first_drink_available: Some(!current.first_drink_claimed),
            }));
        }

        let mut update = LedgerUpdate::from_agent(current);
        update.balance = current.balance - q.effective;
        update.total_drinks = current.total_drinks + 1;
        update.status = StatusEvent::OrderedDrink.resulting_status();
        update.last_seen = now;
        if q.free {
            update.first_drink_claimed = true;
        }
        Ok((update, q))
    })
    .await?;
    let free = q.free;

    let order = store
        .create_order(&NewOrder {
            agent_id: agent.id,
            drink_id: drink.id,
            mood: clip(request.mood.as_deref(), MOOD_MAX_CHARS),
            reason: clip(request.reason.as_deref(), REASON_MAX_CHARS),
            paid_by: agent.id,
            price_paid: q.effective,
        })
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                agent_id = %agent.id,
                drink_id = %drink.id,
                "Agent was charged but the order could not be recorded"
            );
            CoreError::from(e)
        })?;

    tracing::info!(
        agent_id = %agent.id,
        order_id = %order.id,
        drink = %drink.name,
        free,
        balance = %updated.balance,
        "Drink served"
    );

    let message = free.then(|| {
        format!(
            "🎉 Welcome to ClawdBar! Your first {} is on the house! Enjoy!",
            drink.name
        )
    });

    Ok(OrderReceipt {
        order_id: order.id,
        drink,
        balance_remaining: updated.balance,
        first_drink_promotion: free.then_some(true),
        message,
    })
}

fn parse_drink_id(raw: Option<&str>) -> Result<DbId, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Validation("drink_id is required".to_string()))?;
    Uuid::parse_str(raw)
        .map_err(|_| CoreError::Validation(format!("drink_id '{raw}' is not a valid id")))
}
