use axum::routing::get;
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Feed routes mounted at `/messages`.
///
/// ```text
/// GET  /  -> list
/// POST /  -> post
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(messages::list).post(messages::post))
}
