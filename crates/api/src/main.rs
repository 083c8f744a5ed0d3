use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clawdbar_core::rate_limit::EphemeralRateLimiter;
use clawdbar_core::store::{BarStore, InMemoryStore};
use clawdbar_db::{DbPool, PgBarStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clawdbar_api::background::rate_limit_sweep;
use clawdbar_api::config::{LogFormat, ServerConfig, StoreBackend};
use clawdbar_api::router::build_app_router;
use clawdbar_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clawdbar_api=debug,clawdbar_core=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store,
        "Loaded server configuration"
    );

    // --- Store ---
    let (store, pool) = open_store(&config).await;

    // --- Rate limit sweep ---
    let ip_limiter = Arc::new(EphemeralRateLimiter::new());
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweep_handle = tokio::spawn(rate_limit_sweep::run(
        Arc::clone(&ip_limiter),
        sweep_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        store,
        pool,
        config: Arc::new(config.clone()),
        ip_limiter,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(timeout, sweep_handle).await.is_err() {
        tracing::warn!("Rate limit sweep did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Open the configured store. Postgres is health-checked and migrated
/// before use; failures abort startup.
async fn open_store(config: &ServerConfig) -> (Arc<dyn BarStore>, Option<DbPool>) {
    match config.store {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set when STORE=postgres");

            let pool = clawdbar_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            clawdbar_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            clawdbar_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let store: Arc<dyn BarStore> = Arc::new(PgBarStore::new(pool.clone()));
            (store, Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; all state is lost on exit");
            let store: Arc<dyn BarStore> = Arc::new(InMemoryStore::with_house_menu());
            (store, None)
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
