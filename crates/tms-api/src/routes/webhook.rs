//! # Inbound SMS Webhook & Manual Review Queue
//!
//! The webhook is unauthenticated (SMS providers cannot hold
//! credentials) and **always answers 200** — a non-2xx response would
//! make the provider redeliver, and redelivery storms are exactly what
//! the idempotent resolution path exists to absorb. Failure reasons
//! ride in the response body instead.
//!
//! Messages that cannot be applied automatically (unrecognized intent,
//! no or multiple matching offers) are parked in the review queue,
//! listable by operators at `GET /v1/inbound/review`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use tms_workflow::InboundMessage;

use crate::extractors::extract_json;
use crate::orchestration::{self, InboundOutcome};
use crate::state::{AppState, ReviewItem};

// ── Request DTOs ────────────────────────────────────────────────────

/// Raw webhook payload. Field aliases cover the camelCase variants SMS
/// providers send.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InboundSmsRequest {
    /// Source address (the responding phone number).
    pub from: String,
    /// Destination address (the provisioned brokerage number).
    #[serde(default)]
    pub to: String,
    /// Message body.
    pub body: String,
    /// Provider-assigned message id.
    #[serde(default, alias = "providerMessageId", alias = "message_id")]
    pub provider_message_id: Option<String>,
}

// ── Routers ─────────────────────────────────────────────────────────

/// Build the unauthenticated webhook router.
pub fn webhook_router() -> Router<AppState> {
    Router::new().route("/v1/webhooks/sms", post(inbound_sms))
}

/// Build the authenticated review-queue router.
pub fn review_router() -> Router<AppState> {
    Router::new().route("/v1/inbound/review", get(list_review_queue))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/webhooks/sms — Resolve an inbound SMS response.
#[utoipa::path(
    post,
    path = "/v1/webhooks/sms",
    request_body = InboundSmsRequest,
    responses(
        (status = 200, description = "Always 200; outcome in the body", body = InboundOutcome),
    ),
    tag = "webhook"
)]
pub(crate) async fn inbound_sms(
    State(state): State<AppState>,
    body: Result<Json<InboundSmsRequest>, JsonRejection>,
) -> Json<InboundOutcome> {
    // Even an unparseable body gets a 200: report and move on.
    let req = match extract_json(body) {
        Ok(req) => req,
        Err(err) => {
            tracing::warn!(error = %err, "malformed webhook payload");
            return Json(InboundOutcome {
                success: false,
                matched_offer_id: None,
                applied_decision: None,
                already_processed: false,
                reason: Some("malformed payload".to_string()),
            });
        }
    };

    let outcome = orchestration::apply_inbound(
        &state,
        InboundMessage {
            from: req.from,
            to: req.to,
            body: req.body,
            provider_message_id: req.provider_message_id,
        },
    )
    .await;

    Json(outcome)
}

/// GET /v1/inbound/review — List messages awaiting manual review.
#[utoipa::path(
    get,
    path = "/v1/inbound/review",
    responses(
        (status = 200, description = "Parked messages, newest first", body = Vec<ReviewItem>),
    ),
    tag = "webhook"
)]
pub(crate) async fn list_review_queue(State(state): State<AppState>) -> Json<Vec<ReviewItem>> {
    let mut items = state.review_queue.list();
    items.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    Json(items)
}
