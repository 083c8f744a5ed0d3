use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use clawdbar_core::bar::bar_status;
use clawdbar_core::rate_limit::RateCategory;

use crate::error::AppResult;
use crate::middleware::client_ip::ClientIp;
use crate::state::AppState;

/// GET /api/bar/status
///
/// Who is in, what was ordered lately, and the room's vibe level.
pub async fn status(
    client: ClientIp,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    client.limit(&state, RateCategory::Read)?;

    let status = bar_status(&*state.store, Utc::now()).await?;
    Ok(Json(status))
}
