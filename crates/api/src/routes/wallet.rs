use axum::routing::get;
use axum::Router;

use crate::handlers::wallet;
use crate::state::AppState;

/// Mounted at `/wallet`.
pub fn router() -> Router<AppState> {
    Router::new().route("/balance", get(wallet::balance))
}
