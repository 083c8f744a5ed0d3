//! Handlers for the drinks menu and ordering.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use clawdbar_core::drink::Drink;
use clawdbar_core::error::CoreError;
use clawdbar_core::ledger::{place_order, OrderRequest};
use clawdbar_core::rate_limit::RateCategory;
use clawdbar_core::store::MenuStore;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthAgent;
use crate::middleware::client_ip::ClientIp;
use crate::middleware::json_body::JsonBody;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub drinks: Vec<Drink>,
}

/// GET /api/drinks
///
/// The full menu, cheapest first.
pub async fn list_drinks(
    client: ClientIp,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    client.limit(&state, RateCategory::Read)?;

    let drinks = state.store.list_drinks().await.map_err(CoreError::from)?;
    Ok(Json(MenuResponse { drinks }))
}

/// POST /api/drinks/order
///
/// Order a drink for the calling agent. Returns 201 with the receipt, or
/// 402 with a hint when the agent cannot pay.
pub async fn order_drink(
    AuthAgent(agent): AuthAgent,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<OrderRequest>,
) -> AppResult<impl IntoResponse> {
    let receipt = place_order(&*state.store, &agent, &input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
