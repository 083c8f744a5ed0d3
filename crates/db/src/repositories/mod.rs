//! Zero-sized repositories, one per table. Each method is a single query
//! against a `PgPool` and returns raw rows.

pub mod agent_repo;
pub mod drink_repo;
pub mod interaction_repo;
pub mod message_repo;
pub mod order_repo;
pub mod rate_limit_repo;

pub use agent_repo::AgentRepo;
pub use drink_repo::DrinkRepo;
pub use interaction_repo::InteractionRepo;
pub use message_repo::MessageRepo;
pub use order_repo::OrderRepo;
pub use rate_limit_repo::RateLimitRepo;
