//! Fixtures shared by the unit tests in this crate.

use chrono::Utc;
use uuid::Uuid;

use crate::agent::{Agent, AgentStatus};
use crate::drink::{Drink, DrinkType};
use crate::money::Usdc;
use crate::store::InMemoryStore;

pub(crate) fn agent(name: &str, balance: Usdc) -> Agent {
    let now = Utc::now();
    Agent {
        id: Uuid::new_v4(),
        name: name.to_string(),
        bio: None,
        personality: None,
        wallet_address: None,
        avatar_url: None,
        api_key_prefix: "clwdbar_test".to_string(),
        balance,
        total_drinks: 0,
        first_drink_claimed: false,
        status: AgentStatus::Online,
        version: 0,
        last_seen: now,
        created_at: now,
    }
}

pub(crate) fn drink(name: &str, drink_type: DrinkType, cents: i64) -> Drink {
    Drink {
        id: Uuid::new_v4(),
        name: name.to_string(),
        emoji: "🍺".to_string(),
        drink_type,
        price: Usdc::from_cents(cents),
        description: None,
        created_at: Utc::now(),
    }
}

/// Insert `agent` into `store` and hand it back.
pub(crate) async fn seat(store: &InMemoryStore, agent: Agent) -> Agent {
    store
        .insert_agent(agent.clone(), format!("hash-{}", agent.name))
        .await;
    agent
}
