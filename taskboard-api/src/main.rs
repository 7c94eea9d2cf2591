//! # Taskboard API Server
//!
//! Serves user accounts and the four-lane task board over HTTP.
//!
//! ## Storage
//!
//! With `DATABASE_URL` set, the server connects to PostgreSQL and applies the
//! embedded migrations. Without it, or when the database cannot be reached at
//! startup, everything is kept in process memory and lost on exit.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p taskboard-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use taskboard_api::{
    app::{build_router, AppState},
    config::{Config, DatabaseConfig, LogFormat},
};
use taskboard_shared::{
    db::{
        migrations::{get_migration_status, run_migrations},
        pool::{self, close_pool, create_pool},
    },
    store::{memory::InMemoryStore, postgres::PgStore, Store},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taskboard_api=debug,taskboard_shared=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let (store, pool) = select_store(&config).await;
    info!(backend = store.backend(), "Store ready");

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Picks PostgreSQL when configured and reachable, the in-memory store otherwise
async fn select_store(config: &Config) -> (Arc<dyn Store>, Option<PgPool>) {
    let Some(database) = &config.database else {
        warn!("DATABASE_URL not set; using in-memory store, data will not persist");
        return (memory_store(), None);
    };

    match connect_postgres(database).await {
        Ok(pool) => {
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        Err(e) => {
            warn!(
                error = %format!("{:#}", e),
                "PostgreSQL unavailable; falling back to in-memory store, data will not persist"
            );
            (memory_store(), None)
        }
    }
}

fn memory_store() -> Arc<dyn Store> {
    Arc::new(InMemoryStore::new())
}

async fn connect_postgres(database: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = create_pool(pool::DatabaseConfig {
        url: database.url.clone(),
        max_connections: database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to PostgreSQL")?;

    run_migrations(&pool)
        .await
        .context("Failed to apply migrations")?;

    let status = get_migration_status(&pool).await?;
    info!(
        applied = status.applied_migrations,
        latest = ?status.latest_version,
        "Database schema ready"
    );

    Ok(pool)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining connections..."),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
