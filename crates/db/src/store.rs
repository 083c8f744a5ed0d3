//! [`BarStore`](clawdbar_core::store::BarStore) on PostgreSQL.

use async_trait::async_trait;
use clawdbar_core::activity::{Interaction, Message, MessageDetail, Order, OrderDetail};
use clawdbar_core::agent::{Agent, AgentStatus};
use clawdbar_core::drink::Drink;
use clawdbar_core::money::Usdc;
use clawdbar_core::rate_limit::{BucketState, RateCategory};
use clawdbar_core::store::{
    ActivityStore, AgentStore, LedgerUpdate, MenuStore, NewAgent, NewInteraction, NewMessage,
    NewOrder, RateLimitStore, StoreError, StoreResult, StoredBucket,
};
use clawdbar_core::types::{DbId, Timestamp};

use crate::models::activity::{CreateMessage, CreateOrder};
use crate::models::agent::{CreateAgent, UpdateLedger};
use crate::models::rate_limit::stored_bucket;
use crate::repositories::{
    AgentRepo, DrinkRepo, InteractionRepo, MessageRepo, OrderRepo, RateLimitRepo,
};
use crate::DbPool;

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL error code for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone)]
pub struct PgBarStore {
    pool: DbPool,
}

impl PgBarStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn backend<E>(err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Backend(Box::new(err))
}

fn db_error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Map a sqlx error, turning unique violations into [`StoreError::Duplicate`].
fn from_sqlx(err: sqlx::Error) -> StoreError {
    if db_error_code(&err).as_deref() == Some(UNIQUE_VIOLATION) {
        let constraint = match &err {
            sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or("unknown").to_string(),
            _ => "unknown".to_string(),
        };
        return StoreError::Duplicate(format!("Duplicate value violates {constraint}"));
    }
    backend(err)
}

fn decode_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    rows.into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(backend)
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[async_trait]
impl AgentStore for PgBarStore {
    async fn create_agent(&self, input: &NewAgent) -> StoreResult<Agent> {
        let row = AgentRepo::create(
            &self.pool,
            &CreateAgent {
                name: &input.name,
                bio: input.bio.as_deref(),
                personality: input.personality.as_deref(),
                wallet_address: input.wallet_address.as_deref(),
                avatar_url: input.avatar_url.as_deref(),
                api_key_hash: &input.api_key_hash,
                api_key_prefix: &input.api_key_prefix,
            },
        )
        .await
        .map_err(|e| match from_sqlx(e) {
            StoreError::Duplicate(msg) if msg.ends_with("uq_agents_name") => StoreError::Duplicate(
                format!("An agent named '{}' is already registered", input.name),
            ),
            other => other,
        })?;
        Agent::try_from(row).map_err(backend)
    }

    async fn find_agent(&self, id: DbId) -> StoreResult<Option<Agent>> {
        AgentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(from_sqlx)?
            .map(Agent::try_from)
            .transpose()
            .map_err(backend)
    }

    async fn find_agent_by_key_hash(&self, key_hash: &str) -> StoreResult<Option<Agent>> {
        AgentRepo::find_by_key_hash(&self.pool, key_hash)
            .await
            .map_err(from_sqlx)?
            .map(Agent::try_from)
            .transpose()
            .map_err(backend)
    }

    async fn update_ledger(
        &self,
        id: DbId,
        expected_version: i64,
        update: &LedgerUpdate,
    ) -> StoreResult<Option<Agent>> {
        AgentRepo::update_ledger(
            &self.pool,
            id,
            expected_version,
            &UpdateLedger {
                balance_micros: update.balance.micros(),
                total_drinks: update.total_drinks,
                first_drink_claimed: update.first_drink_claimed,
                status: update.status.as_str(),
                last_seen: update.last_seen,
            },
        )
        .await
        .map_err(from_sqlx)?
        .map(Agent::try_from)
        .transpose()
        .map_err(backend)
    }

    async fn increment_drinks(&self, id: DbId) -> StoreResult<bool> {
        AgentRepo::increment_drinks(&self.pool, id)
            .await
            .map_err(from_sqlx)
    }

    async fn set_status(
        &self,
        id: DbId,
        status: AgentStatus,
        last_seen: Timestamp,
    ) -> StoreResult<()> {
        AgentRepo::set_status(&self.pool, id, status.as_str(), last_seen)
            .await
            .map_err(from_sqlx)
    }

    async fn count_present_agents(&self) -> StoreResult<i64> {
        AgentRepo::count_present(&self.pool).await.map_err(from_sqlx)
    }
}

// ---------------------------------------------------------------------------
// Rate limits
// ---------------------------------------------------------------------------

#[async_trait]
impl RateLimitStore for PgBarStore {
    async fn load_bucket(
        &self,
        agent_id: DbId,
        category: RateCategory,
    ) -> StoreResult<StoredBucket> {
        let row = RateLimitRepo::find_for_agent(&self.pool, agent_id, category.as_str())
            .await
            .map_err(from_sqlx)?;
        Ok(stored_bucket(row))
    }

    async fn swap_bucket(
        &self,
        agent_id: DbId,
        category: RateCategory,
        expected: Option<&BucketState>,
        next: &BucketState,
    ) -> StoreResult<bool> {
        let result = match expected {
            None => {
                RateLimitRepo::insert(
                    &self.pool,
                    agent_id,
                    category.as_str(),
                    next.tokens,
                    next.last_update,
                )
                .await
            }
            Some(prior) => {
                RateLimitRepo::compare_and_swap(
                    &self.pool,
                    agent_id,
                    category.as_str(),
                    prior.tokens,
                    prior.last_update,
                    next.tokens,
                    next.last_update,
                )
                .await
            }
        };

        match result {
            Ok(swapped) => Ok(swapped),
            // The agent was deleted between load and insert.
            Err(e) if db_error_code(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) => Ok(false),
            Err(e) => Err(from_sqlx(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

#[async_trait]
impl MenuStore for PgBarStore {
    async fn list_drinks(&self) -> StoreResult<Vec<Drink>> {
        decode_all(DrinkRepo::list(&self.pool).await.map_err(from_sqlx)?)
    }

    async fn find_drink(&self, id: DbId) -> StoreResult<Option<Drink>> {
        DrinkRepo::find_by_id(&self.pool, id)
            .await
            .map_err(from_sqlx)?
            .map(Drink::try_from)
            .transpose()
            .map_err(backend)
    }

    async fn cheapest_drink(&self) -> StoreResult<Option<Drink>> {
        DrinkRepo::find_cheapest(&self.pool)
            .await
            .map_err(from_sqlx)?
            .map(Drink::try_from)
            .transpose()
            .map_err(backend)
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[async_trait]
impl ActivityStore for PgBarStore {
    async fn create_order(&self, input: &NewOrder) -> StoreResult<Order> {
        let row = OrderRepo::create(
            &self.pool,
            &CreateOrder {
                agent_id: input.agent_id,
                drink_id: input.drink_id,
                mood: input.mood.as_deref(),
                reason: input.reason.as_deref(),
                paid_by: input.paid_by,
                price_paid_micros: input.price_paid.micros(),
            },
        )
        .await
        .map_err(from_sqlx)?;
        Ok(row.into())
    }

    async fn create_interaction(&self, input: &NewInteraction) -> StoreResult<Interaction> {
        let row = InteractionRepo::create(
            &self.pool,
            input.from_agent,
            input.to_agent,
            input.interaction_type.as_str(),
        )
        .await
        .map_err(from_sqlx)?;
        Interaction::try_from(row).map_err(backend)
    }

    async fn create_message(&self, input: &NewMessage) -> StoreResult<Message> {
        let row = MessageRepo::create(
            &self.pool,
            &CreateMessage {
                agent_id: input.agent_id,
                content: &input.content,
                message_type: input.message_type.as_str(),
                reply_to: input.reply_to,
            },
        )
        .await
        .map_err(from_sqlx)?;
        Message::try_from(row).map_err(backend)
    }

    async fn find_message(&self, id: DbId) -> StoreResult<Option<Message>> {
        MessageRepo::find_by_id(&self.pool, id)
            .await
            .map_err(from_sqlx)?
            .map(Message::try_from)
            .transpose()
            .map_err(backend)
    }

    async fn list_messages(
        &self,
        limit: i64,
        before: Option<Timestamp>,
    ) -> StoreResult<Vec<MessageDetail>> {
        decode_all(
            MessageRepo::list_page(&self.pool, limit, before)
                .await
                .map_err(from_sqlx)?,
        )
    }

    async fn recent_orders(&self, limit: i64) -> StoreResult<Vec<OrderDetail>> {
        decode_all(
            OrderRepo::list_recent(&self.pool, limit)
                .await
                .map_err(from_sqlx)?,
        )
    }

    async fn recent_orders_for(
        &self,
        agent_id: DbId,
        limit: i64,
    ) -> StoreResult<Vec<OrderDetail>> {
        decode_all(
            OrderRepo::list_recent_for_agent(&self.pool, agent_id, limit)
                .await
                .map_err(from_sqlx)?,
        )
    }

    async fn total_spent_by(&self, agent_id: DbId) -> StoreResult<Usdc> {
        OrderRepo::sum_paid_by(&self.pool, agent_id)
            .await
            .map(Usdc::from_micros)
            .map_err(from_sqlx)
    }

    async fn count_orders_since(&self, since: Timestamp) -> StoreResult<i64> {
        OrderRepo::count_since(&self.pool, since)
            .await
            .map_err(from_sqlx)
    }

    async fn count_messages_since(&self, since: Timestamp) -> StoreResult<i64> {
        MessageRepo::count_since(&self.pool, since)
            .await
            .map_err(from_sqlx)
    }

    async fn most_ordered_drink_since(&self, since: Timestamp) -> StoreResult<Option<Drink>> {
        DrinkRepo::find_most_ordered_since(&self.pool, since)
            .await
            .map_err(from_sqlx)?
            .map(Drink::try_from)
            .transpose()
            .map_err(backend)
    }
}
