//! hb-server: HTTP surface for stream resolution and administration.
//!
//! This crate ties the hb-* crates into a running server. It provides:
//!
//! - Stream and meta endpoints for stream clients
//! - Administrative JSON API for providers, cache, stats, logs and credentials
//! - Request id propagation and error accounting middleware
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use hb_core::config::Config;
use hb_store::Stores;

use crate::context::AppContext;

/// Start the hubbio server.
///
/// Opens the documents under `server.data_dir`, builds the [`AppContext`] and
/// serves until a shutdown signal is received.
pub async fn start(config: Config) -> hb_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let data_dir = config.server.data_dir.clone();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory {}", data_dir.display());
    }

    let stores = Stores::open(&data_dir, &config);
    tracing::info!(
        "Loaded {} provider(s), {} cached entr(ies)",
        stores.providers.len(),
        stores.cache.len()
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| hb_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, stores);
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| hb_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on http://{addr}");
    tracing::info!("Try stream id 'hubbio:sample-movie' or 'hubbio:sample-hls'");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
