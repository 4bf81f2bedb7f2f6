//! HTTP server for the webstore storefront.
//!
//! Serves the front page, markdown content pages, `robots.txt` and static
//! files. Every request gets a [`ws_assets::RequestContext`] holding its
//! preload set and resource hint state; the maintenance gate runs before
//! any handler.
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (ws-server)
//!                        │
//!                        ├─► request context ──► maintenance gate
//!                        │
//!                        ├─► page handlers ──► spawn_blocking
//!                        │       │
//!                        │       ├─► MarkdownLoader (ws-markdown)
//!                        │       └─► minijinja templates + asset helpers (ws-assets)
//!                        │
//!                        └─► static files (tower-http)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;
mod templates;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use ws_config::Config;
use ws_site::Database;

pub use error::ServerError;

use state::AppState;

/// Open the site database and serve until Ctrl-C.
pub async fn run_server(config: &Config) -> Result<(), ServerError> {
    let db = Database::connect(&config.database_resolved.path)
        .await
        .map_err(ServerError::Site)?;
    let state = Arc::new(AppState::new(config, &db)?);
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.server.host, config.server.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
