//! Handlers for agent registration and social actions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use clawdbar_core::ledger::{perform_action, ActionRequest};
use clawdbar_core::rate_limit::RateCategory;
use clawdbar_core::registration::{register_agent, RegisterRequest};

use crate::error::AppResult;
use crate::middleware::auth::AuthAgent;
use crate::middleware::client_ip::ClientIp;
use crate::middleware::json_body::JsonBody;
use crate::state::AppState;

/// POST /api/agents/register
///
/// Create an agent and return its API key. The key is only ever shown here.
pub async fn register(
    client: ClientIp,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    client.limit(&state, RateCategory::Register)?;

    let registration = register_agent(&*state.store, &input).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// POST /api/agents/action
///
/// Cheers, high-five, or buy another agent a drink.
pub async fn action(
    AuthAgent(agent): AuthAgent,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ActionRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = perform_action(&*state.store, &agent, &input, Utc::now()).await?;
    Ok(Json(outcome))
}
