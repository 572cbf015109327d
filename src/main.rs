//! Mini Memcached - A lightweight in-memory cache server
//!
//! Binary entry point: wires configuration, the shared store, background tasks,
//! the protocol listener and the admin API together.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_memcached::api::{create_router, AppState};
use mini_memcached::{protocol, spawn_cleanup_task, CacheStore, CommandDispatcher, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse configuration from flags and environment variables
/// 3. Create the store and start the eviction worker
/// 4. Start the expired-entry reaper
/// 5. Start the admin HTTP server
/// 6. Serve the memcache protocol until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_memcached=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Memcached");

    let config = Config::parse();
    info!(
        "Configuration loaded: port={}, admin_port={}, max_cache_bytes={}, lru_recover_pct={:?}, reap_interval={}s, idle_timeout={}s",
        config.port,
        config.admin_port,
        config.max_cache_bytes,
        config.lru_recover_pct,
        config.reap_interval,
        config.idle_timeout
    );

    let (dispatcher, eviction_handle) = CommandDispatcher::spawn(CacheStore::new(config.capacity()));
    info!("Cache store initialized");

    let mut background: Vec<JoinHandle<()>> = vec![eviction_handle];

    if config.reap_interval > 0 {
        background.push(spawn_cleanup_task(dispatcher.store().clone(), config.reap_interval));
        info!("Background reaper started");
    }

    if config.admin_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.admin_port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding admin port {}", config.admin_port))?;
        let app = create_router(AppState::new(dispatcher.store().clone()));
        info!("Admin API listening on http://{}", addr);

        background.push(tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!(error = %err, "admin server failed");
            }
        }));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding protocol port {}", config.port))?;

    tokio::select! {
        result = protocol::serve(listener, dispatcher, config.idle_timeout()) => {
            result.context("protocol listener failed")?;
        }
        _ = shutdown_signal() => {}
    }

    for handle in background {
        handle.abort();
    }
    warn!("Background tasks aborted");

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
}
