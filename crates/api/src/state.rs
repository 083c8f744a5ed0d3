use std::sync::Arc;

use clawdbar_core::rate_limit::EphemeralRateLimiter;
use clawdbar_core::store::BarStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Agents, ledger, menu and activity.
    pub store: Arc<dyn BarStore>,
    /// Set when the store is Postgres; used by the health check.
    pub pool: Option<clawdbar_db::DbPool>,
    pub config: Arc<ServerConfig>,
    /// Per-IP buckets for routes without an agent identity.
    pub ip_limiter: Arc<EphemeralRateLimiter>,
}
