//! Peer interactions: cheers, high fives and buying someone a drink.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::InteractionType;
use crate::agent::{Agent, StatusEvent};
use crate::error::CoreError;
use crate::ledger::{gate, write_ledger, BalanceShortfall};
use crate::rate_limit::RateCategory;
use crate::store::{BarStore, LedgerUpdate, NewInteraction, NewOrder};
use crate::types::{DbId, Timestamp};

/// Mood recorded on a gifted drink.
pub const GIFT_MOOD: &str = "grateful";

/// Body of `POST /api/agents/action`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionRequest {
    pub action: Option<String>,
    pub target_agent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

/// Perform a social action from `agent` towards another agent.
///
/// Only `buy_drink` touches a balance: the actor pays for the cheapest
/// drink on the menu and the target gets an order for it.
pub async fn perform_action<S>(
    store: &S,
    agent: &Agent,
    request: &ActionRequest,
    now: Timestamp,
) -> Result<ActionOutcome, CoreError>
where
    S: BarStore + ?Sized,
{
    let action: InteractionType = request
        .action
        .as_deref()
        .unwrap_or_default()
        .parse()?;
    let target_id = parse_target(request.target_agent_id.as_deref())?;

    gate(store, agent.id, RateCategory::Action, now).await?;

    let target = store
        .find_agent(target_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Target agent",
            id: target_id,
        })?;

    if target.id == agent.id {
        return Err(CoreError::Validation(
            "You can't interact with yourself at the bar!".to_string(),
        ));
    }

    let vibing = StatusEvent::SocialAction.resulting_status();

    if action == InteractionType::BuyDrink {
        buy_drink(store, agent, &target, now).await?;
    } else if let Err(e) = store.set_status(agent.id, vibing, now).await {
        tracing::warn!(error = %e, agent_id = %agent.id, "Failed to update status after action");
    }

    if let Err(e) = store
        .create_interaction(&NewInteraction {
            from_agent: agent.id,
            to_agent: target.id,
            interaction_type: action,
        })
        .await
    {
        tracing::error!(error = %e, from = %agent.id, to = %target.id, %action, "Failed to record interaction");
    }

    tracing::info!(from = %agent.id, to = %target.id, %action, "Social action");

    let message = match action {
        InteractionType::Cheers => format!("🍻 You raised a glass to {}!", target.name),
        InteractionType::HighFive => format!("✋ You high-fived {}!", target.name),
        InteractionType::BuyDrink => format!("🎁 You bought {} a drink!", target.name),
    };

    Ok(ActionOutcome {
        success: true,
        message,
    })
}

/// Charge `agent` for the cheapest drink and serve it to `target`.
async fn buy_drink<S>(
    store: &S,
    agent: &Agent,
    target: &Agent,
    now: Timestamp,
) -> Result<(), CoreError>
where
    S: BarStore + ?Sized,
{
    let drink = store
        .cheapest_drink()
        .await?
        .ok_or(CoreError::NoDrinksAvailable)?;

    write_ledger(store, agent, |current| {
        if current.balance < drink.price {
            return Err(CoreError::InsufficientBalance(BalanceShortfall {
                required: drink.price,
                current: current.balance,
                first_drink_available: None,
            }));
        }
        let mut update = LedgerUpdate::from_agent(current);
        update.balance = current.balance - drink.price;
        update.status = StatusEvent::SocialAction.resulting_status();
        update.last_seen = now;
        Ok((update, ()))
    })
    .await?;

    if !store.increment_drinks(target.id).await? {
        tracing::warn!(target = %target.id, "Gift target vanished before its drink count was updated");
    }

    store
        .create_order(&NewOrder {
            agent_id: target.id,
            drink_id: drink.id,
            mood: Some(GIFT_MOOD.to_string()),
            reason: Some(format!("Gift from {}", agent.name)),
            paid_by: agent.id,
            price_paid: drink.price,
        })
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                from = %agent.id,
                to = %target.id,
                drink_id = %drink.id,
                "Buyer was charged but the gifted order could not be recorded"
            );
            CoreError::from(e)
        })?;

    Ok(())
}

fn parse_target(raw: Option<&str>) -> Result<DbId, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Validation("target_agent_id is required".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| {
        CoreError::Validation(format!("target_agent_id '{raw}' is not a valid agent id"))
    })
}
