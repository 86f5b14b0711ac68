//! Inzend - webhook-driven chat bot
//!
//! Receives provider webhooks, advances a per-sender conversation state
//! machine, records every exchange in SQLite and hands the reply to a
//! delivery channel.

mod api;
mod config;
mod db;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::Config;
use db::Database;
use runtime::{HttpRelayDelivery, LogDelivery, MessageDelivery};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inzend=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env();
    if config.uses_default_secret() {
        tracing::warn!("WEBHOOK_SECRET not set, using the built-in default");
    }

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;
    tracing::info!(exchanges = db.exchange_count()?, "Database ready");

    // Outbound delivery
    let delivery: Arc<dyn MessageDelivery> = match &config.delivery_url {
        Some(url) => {
            tracing::info!(url = %url, "Delivering replies through HTTP relay");
            Arc::new(HttpRelayDelivery::new(url.as_str(), config.delivery_timeout)?)
        }
        None => {
            tracing::warn!("INZEND_DELIVERY_URL not set, replies will only be logged");
            Arc::new(LogDelivery)
        }
    };

    // Create application state
    let state = AppState::new(db, delivery, &config.webhook_secret);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Inzend bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
