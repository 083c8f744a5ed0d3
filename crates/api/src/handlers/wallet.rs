use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use clawdbar_core::bar::wallet_summary;

use crate::error::AppResult;
use crate::middleware::auth::AuthAgent;
use crate::state::AppState;

/// GET /api/wallet/balance
pub async fn balance(
    AuthAgent(agent): AuthAgent,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let summary = wallet_summary(&*state.store, &agent, Utc::now()).await?;
    Ok(Json(summary))
}
