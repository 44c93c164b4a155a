// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Webmention Receiver Service
//!
//! Accepts Webmentions at `/api/webmentions`, verifies each one by fetching
//! the `source` document and looking for a link to `target`, and records the
//! verified pairs. `GET /api/webmentions?target=...` lists recorded sources.
//! `/.well-known/webfinger` answers identity redirects from a static table.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is
//! honoured):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RECEIVER_DOMAIN`: Domain targets must belong to (default: helvetica.moe)
//! - `RECEIVER_NAMESPACE`: Path targets must live under (default: /posts)
//! - `FETCH_TIMEOUT_MS`: Upper bound for fetching a source (default: 10000)
//! - `STORE_PATH`: `memory` or a SQLite file path (default: memory)
//! - `STORE_LIST_LIMIT`: Keys per listing before truncation (default: 1000)
//! - `WEBFINGER_ACCOUNTS`: `resource=subject` pairs, comma-separated

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use webmention_receiver::{
    config::Config,
    handlers::{router, AppState},
    store::{MemoryStore, MentionStore, SqliteStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        domain = %config.receiver.domain,
        namespace = %config.receiver.namespace,
        store = %config.store.path,
        fetch_timeout_ms = config.fetch.timeout_ms,
        "Starting Webmention receiver"
    );

    let store = open_store(&config).await?;
    let state = Arc::new(AppState::new(config.clone(), store)?);
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn MentionStore>> {
    let limit = config.store.list_limit;
    if config.store.path == "memory" {
        info!("Using in-memory mention store");
        return Ok(Arc::new(MemoryStore::new(limit)));
    }

    let path = Path::new(&config.store.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(SqliteStore::open(path, limit).await?))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
