//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, reconciler spawning, and Axum
//! server lifecycle.

use crate::application::reconciler::StatsReconciler;
use crate::application::services::{AuthService, LinkService, RedirectService};
use crate::config::Config;
use crate::infrastructure::cache::{LinkCache, MemoryCache, RedisCache};
use crate::infrastructure::persistence::{PgLinkRepository, PgTokenRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or in-process memory cache fallback)
/// - Background stats reconciler
/// - Axum HTTP server with graceful shutdown
///
/// On SIGINT/SIGTERM the server drains in-flight requests, signals the
/// reconciler to stop, and waits for it before returning.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied");

    let cache: Arc<dyn LinkCache> = match &config.redis_url {
        Some(redis_url) => {
            match RedisCache::connect(redis_url, config.link_ttl_seconds, config.stats_ttl_seconds)
                .await
            {
                Ok(redis) => {
                    tracing::info!("Cache enabled (Redis)");
                    Arc::new(redis)
                }
                Err(e) => {
                    // Stats counters live in the cache, so a no-op stand-in is
                    // not an option: fall back to an in-process cache.
                    tracing::warn!("Failed to connect to Redis: {}. Using in-memory cache.", e);
                    Arc::new(MemoryCache::new(
                        config.link_ttl_seconds,
                        config.stats_ttl_seconds,
                    ))
                }
            }
        }
        None => {
            tracing::info!("No Redis configured, using in-memory cache");
            Arc::new(MemoryCache::new(
                config.link_ttl_seconds,
                config.stats_ttl_seconds,
            ))
        }
    };

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let token_repository = Arc::new(PgTokenRepository::new(pool.clone()));

    let link_service = Arc::new(LinkService::new(link_repository.clone(), cache.clone()));
    let redirect_service = Arc::new(RedirectService::new(link_repository.clone(), cache.clone()));
    let auth_service = Arc::new(AuthService::new(
        token_repository,
        config.token_signing_secret.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconciler = StatsReconciler::new(
        link_repository,
        cache.clone(),
        Duration::from_secs(config.stats_sync_interval_seconds),
    );
    let reconciler_handle = tokio::spawn(reconciler.run(shutdown_rx));

    let state = AppState::new(link_service, redirect_service, auth_service, cache);

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, shutting down reconciler");
    let _ = shutdown_tx.send(true);
    let _ = reconciler_handle.await;

    Ok(())
}

/// Resolves when the process receives SIGINT (ctrl-c) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install ctrl-c handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
