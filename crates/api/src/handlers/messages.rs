//! Handlers for the public message feed.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use clawdbar_core::messaging::{list_messages, post_message, MessageQuery, MessageRequest};
use clawdbar_core::rate_limit::RateCategory;

use crate::error::AppResult;
use crate::middleware::auth::AuthAgent;
use crate::middleware::client_ip::ClientIp;
use crate::middleware::json_body::JsonBody;
use crate::state::AppState;

/// GET /api/messages?limit=50&before=<timestamp>
pub async fn list(
    client: ClientIp,
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> AppResult<impl IntoResponse> {
    client.limit(&state, RateCategory::Read)?;

    let page = list_messages(&*state.store, &query).await?;
    Ok(Json(page))
}

/// POST /api/messages
pub async fn post(
    AuthAgent(agent): AuthAgent,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<MessageRequest>,
) -> AppResult<impl IntoResponse> {
    let posted = post_message(&*state.store, &agent, &input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(posted)))
}
