//! Federation Portal - admin console server
//!
//! Serves cached public content and the session-gated admin console for a
//! single operator, backed by the hosted backend.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use federation_portal::api::{create_router, AppState};
use federation_portal::auth::SessionGuard;
use federation_portal::backend::RestClient;
use federation_portal::cache::TimedCache;
use federation_portal::config::Config;
use federation_portal::tasks::spawn_sweep_task;

/// Main entry point for the portal server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the backend client, cache and session guard
/// 4. Start the cache sweep and mount the guard on provider events
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "federation_portal=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Federation Portal");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={}, cache_ttl={}s, sweep_interval={}s, port={}",
        config.backend_url, config.cache_ttl, config.sweep_interval, config.server_port
    );

    let backend =
        Arc::new(RestClient::from_config(&config).context("Failed to build backend client")?);

    let cache = Arc::new(TimedCache::new(config.cache_ttl()));
    let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval());
    info!("Cache sweep task started");

    let guard = Arc::new(SessionGuard::new(backend.clone()).with_login_path(&config.login_path));
    let subscription = guard.mount();
    info!("Session guard mounted");

    let app = create_router(AppState::new(cache, backend, guard));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("Server error")?;

    subscription.release();
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep task.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
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

    sweep_handle.abort();
    warn!("Cache sweep task aborted");
}
