//! Storage seams.
//!
//! The ledger and rate limiter talk to the datastore only through these
//! traits. `clawdbar-db` implements them on PostgreSQL; [`memory`] provides
//! an in-process implementation for tests and local runs.
//!
//! Every method is a single round trip. Nothing here spans a transaction:
//! callers that need read-modify-write semantics use the compare-and-swap
//! methods ([`AgentStore::update_ledger`], [`RateLimitStore::swap_bucket`]).

pub mod memory;

use async_trait::async_trait;

use crate::activity::{
    Interaction, InteractionType, Message, MessageDetail, MessageType, Order, OrderDetail,
};
use crate::agent::{Agent, AgentStatus};
use crate::drink::Drink;
use crate::error::CoreError;
use crate::money::Usdc;
use crate::rate_limit::{BucketState, RateCategory};
use crate::types::{DbId, Timestamp};

pub use memory::InMemoryStore;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. a taken agent name).
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// The backend could not be reached or returned an unexpected failure.
    #[error("Store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => CoreError::Conflict(msg),
            StoreError::Backend(e) => CoreError::Internal(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Write DTOs
// ---------------------------------------------------------------------------

/// Fields for a freshly registered agent.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub bio: Option<String>,
    pub personality: Option<String>,
    pub wallet_address: Option<String>,
    pub avatar_url: Option<String>,
    pub api_key_hash: String,
    pub api_key_prefix: String,
}

/// The full set of ledger fields written by one compare-and-swap.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerUpdate {
    pub balance: Usdc,
    pub total_drinks: i64,
    pub first_drink_claimed: bool,
    pub status: AgentStatus,
    pub last_seen: Timestamp,
}

impl LedgerUpdate {
    /// Start from the agent's current ledger; callers then change what they need.
    pub fn from_agent(agent: &Agent) -> Self {
        Self {
            balance: agent.balance,
            total_drinks: agent.total_drinks,
            first_drink_claimed: agent.first_drink_claimed,
            status: agent.status,
            last_seen: agent.last_seen,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub agent_id: DbId,
    pub drink_id: DbId,
    pub mood: Option<String>,
    pub reason: Option<String>,
    pub paid_by: DbId,
    pub price_paid: Usdc,
}

#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub from_agent: DbId,
    pub to_agent: DbId,
    pub interaction_type: InteractionType,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub agent_id: DbId,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to: Option<DbId>,
}

/// What the store holds for an `(agent, category)` bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoredBucket {
    /// The agent itself does not exist.
    UnknownAgent,
    /// The agent exists but has never been rate limited in this category.
    Empty,
    Present(BucketState),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn create_agent(&self, input: &NewAgent) -> StoreResult<Agent>;

    async fn find_agent(&self, id: DbId) -> StoreResult<Option<Agent>>;

    async fn find_agent_by_key_hash(&self, key_hash: &str) -> StoreResult<Option<Agent>>;

    /// Write `update` only if the agent's version is still `expected_version`,
    /// bumping the version. Returns the updated agent, or `None` when the
    /// version moved on (or the agent is gone).
    async fn update_ledger(
        &self,
        id: DbId,
        expected_version: i64,
        update: &LedgerUpdate,
    ) -> StoreResult<Option<Agent>>;

    /// Add one to `total_drinks` in place. Returns `false` if no such agent.
    async fn increment_drinks(&self, id: DbId) -> StoreResult<bool>;

    /// Overwrite presence fields without touching the ledger or its version.
    async fn set_status(&self, id: DbId, status: AgentStatus, last_seen: Timestamp)
        -> StoreResult<()>;

    /// Agents whose status is anything but offline.
    async fn count_present_agents(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn load_bucket(&self, agent_id: DbId, category: RateCategory)
        -> StoreResult<StoredBucket>;

    /// Replace the bucket only if it still equals `expected` (`None` meaning
    /// no row yet). Returns whether the write happened.
    async fn swap_bucket(
        &self,
        agent_id: DbId,
        category: RateCategory,
        expected: Option<&BucketState>,
        next: &BucketState,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    /// The whole menu, cheapest first.
    async fn list_drinks(&self) -> StoreResult<Vec<Drink>>;

    async fn find_drink(&self, id: DbId) -> StoreResult<Option<Drink>>;

    async fn cheapest_drink(&self) -> StoreResult<Option<Drink>>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn create_order(&self, input: &NewOrder) -> StoreResult<Order>;

    async fn create_interaction(&self, input: &NewInteraction) -> StoreResult<Interaction>;

    async fn create_message(&self, input: &NewMessage) -> StoreResult<Message>;

    async fn find_message(&self, id: DbId) -> StoreResult<Option<Message>>;

    /// Newest first, strictly older than `before` when given.
    async fn list_messages(
        &self,
        limit: i64,
        before: Option<Timestamp>,
    ) -> StoreResult<Vec<MessageDetail>>;

    /// Newest first across all agents.
    async fn recent_orders(&self, limit: i64) -> StoreResult<Vec<OrderDetail>>;

    /// Newest first, orders served to `agent_id`.
    async fn recent_orders_for(&self, agent_id: DbId, limit: i64)
        -> StoreResult<Vec<OrderDetail>>;

    /// Sum of `price_paid` over orders the agent paid for.
    async fn total_spent_by(&self, agent_id: DbId) -> StoreResult<Usdc>;

    async fn count_orders_since(&self, since: Timestamp) -> StoreResult<i64>;

    async fn count_messages_since(&self, since: Timestamp) -> StoreResult<i64>;

    /// The drink ordered most often since `since`, if any orders exist.
    async fn most_ordered_drink_since(&self, since: Timestamp) -> StoreResult<Option<Drink>>;
}

/// Everything the bar needs from storage.
pub trait BarStore: AgentStore + RateLimitStore + MenuStore + ActivityStore {}

impl<T> BarStore for T where T: AgentStore + RateLimitStore + MenuStore + ActivityStore {}
