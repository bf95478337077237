//! # Offer Workflow API
//!
//! ## Endpoints
//!
//! - `POST /v1/offers` — extend a tender or dispatch offer
//! - `POST /v1/offers/:id/response` — apply a direct accept/reject
//! - `GET /v1/offers/:id` — fetch one offer (observes lazy expiry)
//! - `GET /v1/offers` — list offers, newest first, filterable
//! - `GET /v1/offers/:id/audit` — the offer's append-only audit trail

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tms_workflow::{Offer, OfferKind, OfferState, ShipmentStatus};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::orchestration::{self, CreateOfferCommand, Decision};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to extend an offer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOfferRequest {
    /// Target shipment.
    pub shipment_id: Uuid,
    /// Target actor — a carrier for TENDER, a driver for DISPATCH.
    pub actor_id: Uuid,
    /// Offer kind.
    #[schema(value_type = String, example = "TENDER")]
    pub kind: OfferKind,
    /// Tender rate in minor units. Required for TENDER.
    pub amount_cents: Option<i64>,
    /// Assignment message. Required for DISPATCH.
    pub message: Option<String>,
    /// Tender response window in hours (1..=168). Defaults to 24.
    pub expiry_hours: Option<i64>,
}

impl Validate for CreateOfferRequest {
    fn validate(&self) -> Result<(), String> {
        match self.kind {
            OfferKind::Tender => {
                if self.amount_cents.is_none() {
                    return Err("amount_cents is required for TENDER offers".to_string());
                }
            }
            OfferKind::Dispatch => {
                if self.message.as_deref().map_or(true, |m| m.trim().is_empty()) {
                    return Err("message is required for DISPATCH offers".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Request to apply a direct response to an offer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    /// The responding actor; must match the offer's target.
    pub actor_id: Uuid,
    /// The decision.
    #[schema(value_type = String, example = "ACCEPT")]
    pub decision: Decision,
    /// Optional free-text note.
    pub note: Option<String>,
}

impl Validate for RespondRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(note) = &self.note {
            if note.len() > 2000 {
                return Err("note must not exceed 2000 characters".to_string());
            }
        }
        Ok(())
    }
}

/// Flat offer representation returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfferView {
    /// Offer id.
    pub id: Uuid,
    /// Owning shipment.
    pub shipment_id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Offer kind.
    #[schema(value_type = String)]
    pub kind: OfferKind,
    /// Current state.
    #[schema(value_type = String)]
    pub state: OfferState,
    /// Target actor (carrier or driver, per kind).
    pub actor_id: Uuid,
    /// Tender rate in minor units, for TENDER offers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    /// Assignment message, for DISPATCH offers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response deadline, for TENDER offers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// When the response was applied.
    pub responded_at: Option<DateTime<Utc>>,
    /// Who responded.
    pub responded_by: Option<String>,
    /// Response note.
    pub response_note: Option<String>,
    /// When the offer was created.
    pub created_at: DateTime<Utc>,
}

impl From<&Offer> for OfferView {
    fn from(offer: &Offer) -> Self {
        let (amount_cents, message) = match &offer.details {
            tms_workflow::OfferDetails::Tender { amount, .. } => (Some(amount.cents()), None),
            tms_workflow::OfferDetails::Dispatch { message, .. } => {
                (None, Some(message.clone()))
            }
        };
        Self {
            id: *offer.id.as_uuid(),
            shipment_id: *offer.shipment_id.as_uuid(),
            tenant_id: *offer.tenant_id.as_uuid(),
            kind: offer.kind(),
            state: offer.state,
            actor_id: offer.details.actor_uuid(),
            amount_cents,
            message,
            expires_at: offer.details.expires_at(),
            responded_at: offer.responded_at,
            responded_by: offer.responded_by.clone(),
            response_note: offer.response_note.clone(),
            created_at: offer.created_at,
        }
    }
}

/// Response for a created offer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOfferResponse {
    /// The created offer.
    pub offer: OfferView,
    /// Shipment status after the coupled write.
    #[schema(value_type = String)]
    pub shipment_status: ShipmentStatus,
    /// True when the commit succeeded but a post-commit step (mirror or
    /// notification) failed.
    pub degraded: bool,
    /// Post-commit warnings.
    pub warnings: Vec<String>,
}

/// Response for an applied offer resolution.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolutionResponse {
    /// The resolved offer.
    pub offer: OfferView,
    /// Sibling offers cancelled in the same commit.
    pub cancelled_siblings: Vec<Uuid>,
    /// Shipment status after the coupled write.
    #[schema(value_type = String)]
    pub shipment_status: ShipmentStatus,
    /// True when the commit succeeded but a post-commit step failed.
    pub degraded: bool,
    /// Post-commit warnings.
    pub warnings: Vec<String>,
}

/// One audit trail entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditEntryView {
    /// The recorded action.
    pub action: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Who caused it.
    pub actor: String,
    /// Free-text context.
    pub note: Option<String>,
}

/// Query filters for the offer list.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct OfferListQuery {
    /// Restrict to one shipment.
    pub shipment_id: Option<Uuid>,
    /// Restrict to one actor.
    pub actor_id: Option<Uuid>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the offers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/offers", get(list_offers).post(create_offer))
        .route("/v1/offers/:id", get(get_offer))
        .route("/v1/offers/:id/response", post(respond))
        .route("/v1/offers/:id/audit", get(get_audit))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/offers — Extend a tender or dispatch offer.
#[utoipa::path(
    post,
    path = "/v1/offers",
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Offer created", body = CreateOfferResponse),
        (status = 404, description = "Shipment or actor not found", body = crate::error::ErrorBody),
        (status = 409, description = "Duplicate active offer", body = crate::error::ErrorBody),
        (status = 422, description = "Actor ineligible or shipment in wrong state", body = crate::error::ErrorBody),
    ),
    tag = "offers"
)]
pub(crate) async fn create_offer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateOfferRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<CreateOfferResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let envelope = orchestration::create_offer(
        &state,
        &caller,
        CreateOfferCommand {
            shipment_id: req.shipment_id,
            actor_id: req.actor_id,
            kind: req.kind,
            amount_cents: req.amount_cents,
            message: req.message,
            expiry_hours: req.expiry_hours,
        },
    )
    .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(CreateOfferResponse {
            offer: OfferView::from(&envelope.offer),
            shipment_status: envelope.shipment_status,
            degraded: !envelope.warnings.is_empty(),
            warnings: envelope.warnings,
        }),
    ))
}

/// POST /v1/offers/:id/response — Apply a direct accept/reject.
#[utoipa::path(
    post,
    path = "/v1/offers/{id}/response",
    params(("id" = Uuid, Path, description = "Offer id")),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Response applied", body = ResolutionResponse),
        (status = 404, description = "Offer not found", body = crate::error::ErrorBody),
        (status = 409, description = "Offer already resolved", body = crate::error::ErrorBody),
        (status = 410, description = "Offer expired", body = crate::error::ErrorBody),
    ),
    tag = "offers"
)]
pub(crate) async fn respond(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<ResolutionResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let envelope =
        orchestration::respond(&state, &caller, id, req.actor_id, req.decision, req.note).await?;

    Ok(Json(ResolutionResponse {
        offer: OfferView::from(&envelope.offer),
        cancelled_siblings: envelope
            .cancelled_siblings
            .iter()
            .map(|id| *id.as_uuid())
            .collect(),
        shipment_status: envelope.shipment_status,
        degraded: !envelope.warnings.is_empty(),
        warnings: envelope.warnings,
    }))
}

/// GET /v1/offers/:id — Fetch one offer.
#[utoipa::path(
    get,
    path = "/v1/offers/{id}",
    params(("id" = Uuid, Path, description = "Offer id")),
    responses(
        (status = 200, description = "Offer found", body = OfferView),
        (status = 404, description = "Offer not found", body = crate::error::ErrorBody),
    ),
    tag = "offers"
)]
pub(crate) async fn get_offer(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferView>, AppError> {
    let offer = orchestration::get_offer(&state, &caller, id).await?;
    Ok(Json(OfferView::from(&offer)))
}

/// GET /v1/offers — List offers, newest first.
#[utoipa::path(
    get,
    path = "/v1/offers",
    params(OfferListQuery),
    responses(
        (status = 200, description = "Offers visible to the caller", body = Vec<OfferView>),
    ),
    tag = "offers"
)]
pub(crate) async fn list_offers(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<OfferListQuery>,
) -> Json<Vec<OfferView>> {
    let offers =
        orchestration::list_offers(&state, &caller, query.shipment_id, query.actor_id);
    Json(offers.iter().map(OfferView::from).collect())
}

/// GET /v1/offers/:id/audit — The offer's append-only audit trail.
#[utoipa::path(
    get,
    path = "/v1/offers/{id}/audit",
    params(("id" = Uuid, Path, description = "Offer id")),
    responses(
        (status = 200, description = "Audit trail, oldest first", body = Vec<AuditEntryView>),
        (status = 404, description = "Offer not found", body = crate::error::ErrorBody),
    ),
    tag = "offers"
)]
pub(crate) async fn get_audit(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditEntryView>>, AppError> {
    let offer = orchestration::get_offer(&state, &caller, id).await?;
    let entries = offer
        .audit_trail
        .iter()
        .map(|entry| AuditEntryView {
            action: entry.action.name().to_string(),
            timestamp: entry.timestamp,
            actor: entry.actor.clone(),
            note: entry.note.clone(),
        })
        .collect();
    Ok(Json(entries))
}
