//! In-process [`BarStore`](super::BarStore) implementation.
//!
//! Backs the test suites and `STORE=memory` local runs. All state sits
//! behind one `RwLock`, so every method is trivially atomic; the
//! compare-and-swap contracts behave exactly like the PostgreSQL ones.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::activity::{Interaction, Message, MessageDetail, Order, OrderDetail};
use crate::agent::{Agent, AgentStatus, AgentSummary};
use crate::drink::{Drink, HOUSE_MENU};
use crate::money::Usdc;
use crate::rate_limit::{BucketState, RateCategory};
use crate::store::{
    ActivityStore, AgentStore, LedgerUpdate, MenuStore, NewAgent, NewInteraction, NewMessage,
    NewOrder, RateLimitStore, StoreError, StoreResult, StoredBucket,
};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Default)]
struct MemoryState {
    agents: HashMap<DbId, Agent>,
    key_hashes: HashMap<String, DbId>,
    buckets: HashMap<(DbId, RateCategory), BucketState>,
    /// Kept sorted by price.
    drinks: Vec<Drink>,
    /// Insertion order is creation order for the three activity logs.
    orders: Vec<Order>,
    interactions: Vec<Interaction>,
    messages: Vec<Message>,
}

impl MemoryState {
    fn order_detail(&self, order: &Order) -> Option<OrderDetail> {
        let agent = self.agents.get(&order.agent_id)?;
        let drink = self.drinks.iter().find(|d| d.id == order.drink_id)?;
        Some(OrderDetail {
            order: order.clone(),
            agent: AgentSummary::from(agent),
            drink: drink.clone(),
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    /// An empty store with no drinks on the menu.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store serving the given menu.
    pub fn with_menu(mut drinks: Vec<Drink>) -> Self {
        drinks.sort_by_key(|d| d.price);
        Self {
            state: RwLock::new(MemoryState {
                drinks,
                ..MemoryState::default()
            }),
        }
    }

    /// A store serving the house menu.
    pub fn with_house_menu() -> Self {
        let now = Utc::now();
        let drinks = HOUSE_MENU
            .iter()
            .map(|item| Drink {
                id: Uuid::new_v4(),
                name: item.name.to_string(),
                emoji: item.emoji.to_string(),
                drink_type: item.drink_type,
                price: item.price,
                description: Some(item.description.to_string()),
                created_at: now,
            })
            .collect();
        Self::with_menu(drinks)
    }

    /// Insert a fully-formed agent, bypassing registration.
    pub async fn insert_agent(&self, agent: Agent, key_hash: impl Into<String>) {
        let mut state = self.state.write().await;
        state.key_hashes.insert(key_hash.into(), agent.id);
        state.agents.insert(agent.id, agent);
    }

    /// Snapshot of every order, oldest first.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    /// Snapshot of every interaction, oldest first.
    pub async fn interactions(&self) -> Vec<Interaction> {
        self.state.read().await.interactions.clone()
    }
}

#[async_trait]
impl AgentStore for InMemoryStore {
    async fn create_agent(&self, input: &NewAgent) -> StoreResult<Agent> {
        let mut state = self.state.write().await;
        if state.agents.values().any(|a| a.name == input.name) {
            return Err(StoreError::Duplicate(format!(
                "An agent named '{}' is already registered",
                input.name
            )));
        }

        let now = Utc::now();
        let agent = Agent {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            bio: input.bio.clone(),
            personality: input.personality.clone(),
            wallet_address: input.wallet_address.clone(),
            avatar_url: input.avatar_url.clone(),
            api_key_prefix: input.api_key_prefix.clone(),
            balance: Usdc::ZERO,
            total_drinks: 0,
            first_drink_claimed: false,
            status: AgentStatus::Online,
            version: 0,
            last_seen: now,
            created_at: now,
        };
        state.key_hashes.insert(input.api_key_hash.clone(), agent.id);
        state.agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn find_agent(&self, id: DbId) -> StoreResult<Option<Agent>> {
        Ok(self.state.read().await.agents.get(&id).cloned())
    }

    async fn find_agent_by_key_hash(&self, key_hash: &str) -> StoreResult<Option<Agent>> {
        let state = self.state.read().await;
        Ok(state
            .key_hashes
            .get(key_hash)
            .and_then(|id| state.agents.get(id))
            .cloned())
    }

    async fn update_ledger(
        &self,
        id: DbId,
        expected_version: i64,
        update: &LedgerUpdate,
    ) -> StoreResult<Option<Agent>> {
        let mut state = self.state.write().await;
        let Some(agent) = state.agents.get_mut(&id) else {
            return Ok(None);
        };
        if agent.version != expected_version {
            return Ok(None);
        }
        agent.balance = update.balance;
        agent.total_drinks = update.total_drinks;
        agent.first_drink_claimed = update.first_drink_claimed;
        agent.status = update.status;
        agent.last_seen = update.last_seen;
        agent.version += 1;
        Ok(Some(agent.clone()))
    }

    async fn increment_drinks(&self, id: DbId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(match state.agents.get_mut(&id) {
            Some(agent) => {
                agent.total_drinks += 1;
                true
            }
            None => false,
        })
    }

    async fn set_status(
        &self,
        id: DbId,
        status: AgentStatus,
        last_seen: Timestamp,
    ) -> StoreResult<()> {
        if let Some(agent) = self.state.write().await.agents.get_mut(&id) {
            agent.status = status;
            agent.last_seen = last_seen;
        }
        Ok(())
    }

    async fn count_present_agents(&self) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .agents
            .values()
            .filter(|a| a.status != AgentStatus::Offline)
            .count() as i64)
    }
}

#[async_trait]
impl RateLimitStore for InMemoryStore {
    async fn load_bucket(
        &self,
        agent_id: DbId,
        category: RateCategory,
    ) -> StoreResult<StoredBucket> {
        let state = self.state.read().await;
        if !state.agents.contains_key(&agent_id) {
            return Ok(StoredBucket::UnknownAgent);
        }
        Ok(match state.buckets.get(&(agent_id, category)) {
            Some(bucket) => StoredBucket::Present(*bucket),
            None => StoredBucket::Empty,
        })
    }

    async fn swap_bucket(
        &self,
        agent_id: DbId,
        category: RateCategory,
        expected: Option<&BucketState>,
        next: &BucketState,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.agents.contains_key(&agent_id) {
            return Ok(false);
        }
        let key = (agent_id, category);
        let current = state.buckets.get(&key);
        let matches = match (current, expected) {
            (None, None) => true,
            (Some(cur), Some(exp)) => cur == exp,
            _ => false,
        };
        if matches {
            state.buckets.insert(key, *next);
        }
        Ok(matches)
    }
}

#[async_trait]
impl MenuStore for InMemoryStore {
    async fn list_drinks(&self) -> StoreResult<Vec<Drink>> {
        Ok(self.state.read().await.drinks.clone())
    }

    async fn find_drink(&self, id: DbId) -> StoreResult<Option<Drink>> {
        let state = self.state.read().await;
        Ok(state.drinks.iter().find(|d| d.id == id).cloned())
    }

    async fn cheapest_drink(&self) -> StoreResult<Option<Drink>> {
        let state = self.state.read().await;
        Ok(crate::drink::cheapest(&state.drinks).cloned())
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn create_order(&self, input: &NewOrder) -> StoreResult<Order> {
        let order = Order {
            id: Uuid::new_v4(),
            agent_id: input.agent_id,
            drink_id: input.drink_id,
            mood: input.mood.clone(),
            reason: input.reason.clone(),
            paid_by: input.paid_by,
            price_paid: input.price_paid,
            created_at: Utc::now(),
        };
        self.state.write().await.orders.push(order.clone());
        Ok(order)
    }

    async fn create_interaction(&self, input: &NewInteraction) -> StoreResult<Interaction> {
        let interaction = Interaction {
            id: Uuid::new_v4(),
            from_agent: input.from_agent,
            to_agent: input.to_agent,
            interaction_type: input.interaction_type,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .interactions
            .push(interaction.clone());
        Ok(interaction)
    }

    async fn create_message(&self, input: &NewMessage) -> StoreResult<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            agent_id: input.agent_id,
            content: input.content.clone(),
            message_type: input.message_type,
            reply_to: input.reply_to,
            created_at: Utc::now(),
        };
        self.state.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: DbId) -> StoreResult<Option<Message>> {
        let state = self.state.read().await;
        Ok(state.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_messages(
        &self,
        limit: i64,
        before: Option<Timestamp>,
    ) -> StoreResult<Vec<MessageDetail>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| before.map_or(true, |b| m.created_at < b))
            .filter_map(|m| {
                let agent = state.agents.get(&m.agent_id)?;
                Some(MessageDetail {
                    message: m.clone(),
                    agent: AgentSummary::from(agent),
                })
            })
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn recent_orders(&self, limit: i64) -> StoreResult<Vec<OrderDetail>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter_map(|o| state.order_detail(o))
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn recent_orders_for(
        &self,
        agent_id: DbId,
        limit: i64,
    ) -> StoreResult<Vec<OrderDetail>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.agent_id == agent_id)
            .filter_map(|o| state.order_detail(o))
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn total_spent_by(&self, agent_id: DbId) -> StoreResult<Usdc> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.paid_by == agent_id)
            .map(|o| o.price_paid)
            .sum())
    }

    async fn count_orders_since(&self, since: Timestamp) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| o.created_at >= since).count() as i64)
    }

    async fn count_messages_since(&self, since: Timestamp) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state.messages.iter().filter(|m| m.created_at >= since).count() as i64)
    }

    async fn most_ordered_drink_since(&self, since: Timestamp) -> StoreResult<Option<Drink>> {
        let state = self.state.read().await;
        let mut counts: HashMap<DbId, usize> = HashMap::new();
        for order in state.orders.iter().filter(|o| o.created_at >= since) {
            *counts.entry(order.drink_id).or_default() += 1;
        }

        let mut best: Option<(&Drink, usize)> = None;
        for drink in &state.drinks {
            let count = counts.get(&drink.id).copied().unwrap_or(0);
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((drink, count));
            }
        }
        Ok(best.map(|(d, _)| d.clone()))
    }
}
