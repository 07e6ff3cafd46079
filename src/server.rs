use anyhow::Result;
use arc_swap::ArcSwap;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    auth::{self, AuthMiddlewareState},
    config::Config,
    handlers::{self, AppState},
    pricing::PricingService,
    signals::setup_signal_handlers,
};

/// Open (and create if missing) the SQLite database and run migrations
pub async fn connect_database(path: &str) -> Result<SqlitePool> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
    let pool = SqlitePool::connect_with(options)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    Ok(pool)
}

/// Start the quote server
///
/// This function:
/// 1. Opens the database and warms the pricing cache
/// 2. Sets up signal handlers for graceful shutdown and config reload
/// 3. Binds to the configured address
/// 4. Serves requests with graceful shutdown support
pub async fn start_server(config: Config, config_path: PathBuf) -> Result<()> {
    info!(database = %config.database.path, "Lease quote server starting...");

    let db_pool = connect_database(&config.database.path).await?;

    let pricing = Arc::new(PricingService::new(db_pool.clone()));
    pricing
        .load_cache()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load pricing settings: {}", e))?;

    // Wrap config in ArcSwap for atomic reload support
    let config_swap = Arc::new(ArcSwap::from_pointee(config.clone()));

    let (shutdown_tx, signal_handle) = setup_signal_handlers(config_swap.clone(), config_path);
    let mut shutdown_rx = shutdown_tx.subscribe();

    let app_state = AppState::new(db_pool.clone(), pricing);
    let auth_state = AuthMiddlewareState {
        config: config_swap,
    };
    let app = create_router(app_state, auth_state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting lease quote server on {}", addr);
    info!(
        "Configuration: {} users ({} enabled)",
        config.users.len(),
        config.users.iter().filter(|u| u.enabled).count()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    db_pool.close().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(app_state: AppState, auth_state: AuthMiddlewareState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/rates",
            get(handlers::settings::get_rates).put(handlers::settings::update_rates),
        )
        .route(
            "/api/rates/preview/:key",
            get(handlers::settings::rate_preview),
        )
        .route(
            "/api/tco-settings",
            get(handlers::settings::get_tco_settings).put(handlers::settings::update_tco_settings),
        )
        .route("/api/pricing/item", post(handlers::pricing::price_item))
        .route("/api/pricing/quote", post(handlers::pricing::price_quote))
        .route(
            "/api/quotes",
            get(handlers::quotes::list_quotes).post(handlers::quotes::create_quote),
        )
        .route(
            "/api/quotes/:id",
            get(handlers::quotes::get_quote)
                .put(handlers::quotes::update_quote)
                .delete(handlers::quotes::delete_quote),
        )
        .route(
            "/api/quotes/:id/summary",
            get(handlers::quotes::quote_summary),
        )
        .route("/api/quotes/:id/tco", get(handlers::quotes::quote_tco))
        .layer(middleware::from_fn_with_state(
            auth_state,
            auth::auth_middleware,
        ));

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .merge(api_routes)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
}
