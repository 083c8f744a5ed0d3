use axum::routing::get;
use axum::Router;

use crate::handlers::bar;
use crate::state::AppState;

/// Mounted at `/bar`.
pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(bar::status))
}
