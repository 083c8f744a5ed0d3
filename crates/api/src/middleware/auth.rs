//! API-key authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use clawdbar_core::agent::{Agent, StatusEvent};
use clawdbar_core::api_keys::{extract_prefix, hash_api_key, API_KEY_HEADER};
use clawdbar_core::error::CoreError;
use clawdbar_core::store::AgentStore;

use crate::error::AppError;
use crate::state::AppState;

const UNAUTHORIZED_MESSAGE: &str = "Invalid or missing API key. Include X-Agent-Key header.";

/// The agent owning the API key in the `X-Agent-Key` header.
///
/// Resolving an agent also marks it online and refreshes `last_seen`; the
/// wrapped [`Agent`] reflects that.
///
/// ```ignore
/// async fn my_handler(AuthAgent(agent): AuthAgent) -> AppResult<Json<()>> {
///     tracing::info!(agent_id = %agent.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthAgent(pub Agent);

impl FromRequestParts<AppState> for AuthAgent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(unauthorized)?;

        let mut agent = state
            .store
            .find_agent_by_key_hash(&hash_api_key(key))
            .await
            .map_err(CoreError::from)?
            .ok_or_else(|| {
                tracing::debug!(key_prefix = extract_prefix(key), "Unknown API key");
                unauthorized()
            })?;

        let now = Utc::now();
        let status = StatusEvent::Authenticated.resulting_status();
        match state.store.set_status(agent.id, status, now).await {
            Ok(()) => {
                agent.status = status;
                agent.last_seen = now;
            }
            Err(e) => {
                tracing::warn!(agent_id = %agent.id, error = %e, "Failed to refresh agent presence");
            }
        }

        Ok(AuthAgent(agent))
    }
}

fn unauthorized() -> AppError {
    AppError::Core(CoreError::Unauthorized(UNAUTHORIZED_MESSAGE.into()))
}
