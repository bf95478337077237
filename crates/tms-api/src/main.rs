//! # tms-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the offer/response workflow.
//! Configuration is environment-driven:
//!
//! - `PORT` — listen port (default 8080)
//! - `AUTH_TOKEN` — bearer secret; unset disables authentication
//! - `DATABASE_URL` — Postgres durability mirror; unset runs in-memory
//! - `EXPIRY_SWEEP_SECS` — optional periodic expiry sweep interval

use std::sync::Arc;

use tms_api::auth::SecretToken;
use tms_api::notify::LogNotifier;
use tms_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let auth_token = std::env::var("AUTH_TOKEN").ok().map(SecretToken::new);
    if auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set — authentication disabled");
    }
    let sweep_interval_secs = std::env::var("EXPIRY_SWEEP_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0);

    let config = AppConfig {
        port,
        auth_token,
        sweep_interval_secs,
    };

    let db_pool = tms_api::db::init_pool().await.map_err(|e| {
        tracing::error!("database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_parts(config, Arc::new(LogNotifier), db_pool);

    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("database hydration failed: {e}");
        e
    })?;

    if let Some(interval) = state.config.sweep_interval_secs {
        tms_api::sweeper::spawn(state.clone(), interval);
    }

    let app = tms_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("TMS API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
