//! # Shipment CRUD
//!
//! Minimal shipment plumbing: enough to stand a shipment up in QUOTED
//! and observe the workflow move it. Rating, documents, and tracking
//! live in other services.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use uuid::Uuid;

use tms_core::ShipmentId;
use tms_workflow::ShipmentStatus;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, ShipmentRecord};

// ── Request DTOs ────────────────────────────────────────────────────

/// Request to create a shipment.
#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct CreateShipmentRequest {
    /// Customer-facing reference.
    pub reference: String,
    /// Origin location label.
    pub origin: String,
    /// Destination location label.
    pub destination: String,
    /// Owning tenant. Required for admin callers; ignored for
    /// operators, who always create into their own tenant.
    pub tenant_id: Option<Uuid>,
}

impl Validate for CreateShipmentRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reference.trim().is_empty() {
            return Err("reference must not be empty".to_string());
        }
        if self.origin.trim().is_empty() {
            return Err("origin must not be empty".to_string());
        }
        if self.destination.trim().is_empty() {
            return Err("destination must not be empty".to_string());
        }
        Ok(())
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the shipments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/shipments", get(list_shipments).post(create_shipment))
        .route("/v1/shipments/:id", get(get_shipment))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/shipments — Create a shipment in QUOTED.
#[utoipa::path(
    post,
    path = "/v1/shipments",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created", body = ShipmentRecord),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub(crate) async fn create_shipment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateShipmentRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ShipmentRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let tenant_id = caller.creation_tenant(req.tenant_id)?;
    let now = Utc::now();

    let record = ShipmentRecord {
        id: ShipmentId::new(),
        tenant_id,
        reference: req.reference,
        origin: req.origin,
        destination: req.destination,
        status: ShipmentStatus::Quoted,
        assigned_carrier: None,
        assigned_driver: None,
        offers: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    state.shipments.insert(*record.id.as_uuid(), record.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(err) = crate::db::shipments::persist(pool, &record).await {
            tracing::error!(shipment = %record.id, error = %err, "shipment mirror write failed");
        }
    }

    Ok((axum::http::StatusCode::CREATED, Json(record)))
}

/// GET /v1/shipments — List shipments visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/shipments",
    responses(
        (status = 200, description = "Shipments, newest first", body = Vec<ShipmentRecord>),
    ),
    tag = "shipments"
)]
pub(crate) async fn list_shipments(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<Vec<ShipmentRecord>> {
    let mut shipments: Vec<ShipmentRecord> = state
        .shipments
        .list()
        .into_iter()
        .filter(|s| caller.can_access_tenant(s.tenant_id))
        .collect();
    shipments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(shipments)
}

/// GET /v1/shipments/:id — Fetch one shipment.
#[utoipa::path(
    get,
    path = "/v1/shipments/{id}",
    params(("id" = Uuid, Path, description = "Shipment id")),
    responses(
        (status = 200, description = "Shipment found", body = ShipmentRecord),
        (status = 404, description = "Shipment not found", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub(crate) async fn get_shipment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ShipmentRecord>, AppError> {
    state
        .shipments
        .get(&id)
        .filter(|s| caller.can_access_tenant(s.tenant_id))
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("shipment {id} not found")))
}
