pub mod agents;
pub mod bar;
pub mod drinks;
pub mod health;
pub mod messages;
pub mod wallet;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /api
/// ├── /drinks            list menu (GET)
/// │   └── /order         order a drink (POST, agent key)
/// ├── /agents
/// │   ├── /register      register (POST)
/// │   └── /action        cheers / high_five / buy_drink (POST, agent key)
/// ├── /messages          feed (GET), post (POST, agent key)
/// ├── /wallet
/// │   └── /balance       wallet summary (GET, agent key)
/// └── /bar
///     └── /status        room status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/drinks", drinks::router())
        .nest("/agents", agents::router())
        .nest("/messages", messages::router())
        .nest("/wallet", wallet::router())
        .nest("/bar", bar::router())
}
