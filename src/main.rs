//! Transit Cache - transit catalog server with a two-tier cache
//!
//! Serves routes and stops over HTTP, caching reads in Redis with a
//! process-local fallback.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transit_cache::api::create_router;
use transit_cache::cache::{CacheBackend, DisabledStore, LocalStore, RedisStore, TieredCache};
use transit_cache::catalog::{CatalogService, TransitCatalog};
use transit_cache::{spawn_cleanup_task, AppState, Config};

/// Main entry point for the transit cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the primary (Redis or disabled) and local cache tiers
/// 4. Connect the tiers and start the local sweeper
/// 5. Seed the catalog and create the Axum router
/// 6. Serve until SIGINT/SIGTERM, then close the cache tiers
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transit_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting transit cache server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        redis = config.redis_url.is_some(),
        local_max_entries = config.local_max_entries,
        cleanup_interval = config.cleanup_interval,
        "Configuration loaded"
    );

    let primary: Arc<dyn CacheBackend> = match config.redis_store_config() {
        Some(redis) => Arc::new(RedisStore::new(redis).context("invalid REDIS_URL")?),
        None => {
            warn!("REDIS_URL not set; caching in process memory only, list invalidation disabled");
            Arc::new(DisabledStore)
        }
    };
    let local = LocalStore::new(config.local_max_entries);
    let cache = Arc::new(TieredCache::new(primary, Arc::new(local.clone())));
    cache.connect().await;

    let cleanup_handle = spawn_cleanup_task(local, config.cleanup_interval);

    let catalog = Arc::new(TransitCatalog::with_seed_data().await);
    let service = CatalogService::new(catalog, Arc::clone(&cache), config.catalog_ttls());
    let app = create_router(AppState::new(service, Arc::clone(&cache)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    cache.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweeper.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Local cache sweeper aborted");
}
