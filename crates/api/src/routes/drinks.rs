use axum::routing::{get, post};
use axum::Router;

use crate::handlers::drinks;
use crate::state::AppState;

/// Menu and ordering routes mounted at `/drinks`.
///
/// ```text
/// GET  /       -> list_drinks
/// POST /order  -> order_drink
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(drinks::list_drinks))
        .route("/order", post(drinks::order_drink))
}
