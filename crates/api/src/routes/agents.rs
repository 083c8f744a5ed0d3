use axum::routing::post;
use axum::Router;

use crate::handlers::agents;
use crate::state::AppState;

/// Agent routes mounted at `/agents`.
///
/// ```text
/// POST /register  -> register
/// POST /action    -> action
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(agents::register))
        .route("/action", post(agents::action))
}
