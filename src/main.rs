//! Lesson Cache - bounded, persistent response cache service
//!
//! Serves the shared cache to the generation pipeline and the performance
//! governor, and snapshots it to disk on shutdown.

use std::net::SocketAddr;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lesson_cache::api::{create_router, AppState};
use lesson_cache::Config;

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache store, restoring the last snapshot, with its
///    background expiration sweep
/// 4. Serve the HTTP API until Ctrl+C/SIGTERM
/// 5. Stop the sweep and flush a fresh snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lesson_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lesson Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, max_total_size_bytes={}, default_ttl={}s, port={}, sweep_interval={}s, snapshot={}",
        config.cache.max_entries,
        config.cache.max_total_size_bytes,
        config.cache.default_ttl_secs,
        config.server_port,
        config.sweep_interval,
        config.snapshot_path.display()
    );

    let state = AppState::from_config(&config);
    info!("Cache store opened ({} entries)", state.cache.read().await.len());

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.stop_sweep();
    info!("Expiration sweep stopped");

    state.cache.read().await.flush();
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
