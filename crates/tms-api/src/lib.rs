//! # tms-api — Axum API Service for the TMS Stack
//!
//! HTTP surface for the freight-brokerage offer/response workflow:
//! tendering shipments to carriers, dispatching them to drivers, and
//! resolving responses arriving either as direct authenticated calls or
//! as unauthenticated inbound SMS webhooks.
//!
//! ## API Surface
//!
//! | Prefix                | Module                  | Auth |
//! |-----------------------|-------------------------|------|
//! | `/v1/offers/*`        | [`routes::offers`]      | yes  |
//! | `/v1/shipments/*`     | [`routes::shipments`]   | yes  |
//! | `/v1/carriers`, `/v1/drivers` | [`routes::actors`] | yes |
//! | `/v1/inbound/review`  | [`routes::webhook`]     | yes  |
//! | `/v1/webhooks/sms`    | [`routes::webhook`]     | no — always 200 |
//! | `/health/*`           | liveness/readiness      | no   |
//! | `/openapi.json`       | [`openapi`]             | yes  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → Metrics → Auth → Handler          (API surface)
//! TraceLayer → Metrics → RateLimit → Handler     (webhook surface)
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod notify;
pub mod openapi;
pub mod orchestration;
pub mod routes;
pub mod state;
pub mod sweeper;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

pub use error::AppError;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and the SMS webhook are mounted outside the auth
/// middleware: probes need no credentials, and the webhook's contract
/// is to accept unauthenticated provider traffic (rate-limited, always
/// answered with 200).
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(RateLimitConfig::default());

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::offers::router())
        .merge(routes::shipments::router())
        .merge(routes::actors::router())
        .merge(routes::webhook::review_router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    // Unauthenticated webhook, rate-limited by client address.
    let webhook = Router::new()
        .merge(routes::webhook::webhook_router())
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(axum::Extension(limiter))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(health)
        .merge(webhook)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
}

/// Liveness probe — 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — 200 when the application can serve traffic.
async fn readiness() -> &'static str {
    "ready"
}
