//! # Carrier & Driver Registries
//!
//! Registration endpoints for the actors offers are extended to. The
//! attributes captured here feed the eligibility gate (status, license
//! and medical-certificate expiry) and inbound correlation (the
//! driver's registered contact number).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tms_core::{CarrierId, ContactNumber, DriverId};
use tms_workflow::{Carrier, CarrierStatus, Driver, DriverStatus};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

/// Request to register a carrier.
#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct CreateCarrierRequest {
    /// Legal name.
    pub name: String,
    /// Dispatch-desk contact number.
    pub contact: String,
    /// Operating status. Defaults to ACTIVE.
    #[schema(value_type = Option<String>)]
    pub status: Option<CarrierStatus>,
    /// Owning tenant. Required for admin callers.
    pub tenant_id: Option<Uuid>,
}

impl Validate for CreateCarrierRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Request to register a driver.
#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct CreateDriverRequest {
    /// Display name.
    pub name: String,
    /// Registered mobile number — the inbound correlation key.
    pub contact: String,
    /// CDL expiration date.
    pub license_expires_at: DateTime<Utc>,
    /// DOT medical certificate expiration, if on file.
    pub medical_cert_expires_at: Option<DateTime<Utc>>,
    /// Duty status. Defaults to ACTIVE.
    #[schema(value_type = Option<String>)]
    pub status: Option<DriverStatus>,
    /// Whether the record is active. Defaults to true.
    pub active: Option<bool>,
    /// Owning tenant. Required for admin callers.
    pub tenant_id: Option<Uuid>,
}

impl Validate for CreateDriverRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the actor registries router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/carriers", get(list_carriers).post(create_carrier))
        .route("/v1/drivers", get(list_drivers).post(create_driver))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/carriers — Register a carrier.
#[utoipa::path(
    post,
    path = "/v1/carriers",
    request_body = CreateCarrierRequest,
    responses(
        (status = 201, description = "Carrier registered"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "actors"
)]
pub(crate) async fn create_carrier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCarrierRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<Carrier>), AppError> {
    let req = extract_validated_json(body)?;
    let tenant_id = caller.creation_tenant(req.tenant_id)?;
    let contact = ContactNumber::new(&req.contact)?;

    let carrier = Carrier {
        id: CarrierId::new(),
        tenant_id,
        name: req.name,
        status: req.status.unwrap_or(CarrierStatus::Active),
        contact,
        created_at: Utc::now(),
    };

    state.carriers.insert(*carrier.id.as_uuid(), carrier.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(err) = crate::db::actors::upsert_carrier(pool, &carrier).await {
            tracing::error!(carrier = %carrier.id, error = %err, "carrier mirror write failed");
        }
    }

    Ok((axum::http::StatusCode::CREATED, Json(carrier)))
}

/// GET /v1/carriers — List carriers visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/carriers",
    responses((status = 200, description = "Carriers")),
    tag = "actors"
)]
pub(crate) async fn list_carriers(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<Vec<Carrier>> {
    let mut carriers: Vec<Carrier> = state
        .carriers
        .list()
        .into_iter()
        .filter(|c| caller.can_access_tenant(c.tenant_id))
        .collect();
    carriers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(carriers)
}

/// POST /v1/drivers — Register a driver.
#[utoipa::path(
    post,
    path = "/v1/drivers",
    request_body = CreateDriverRequest,
    responses(
        (status = 201, description = "Driver registered"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "actors"
)]
pub(crate) async fn create_driver(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateDriverRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<Driver>), AppError> {
    let req = extract_validated_json(body)?;
    let tenant_id = caller.creation_tenant(req.tenant_id)?;
    let contact = ContactNumber::new(&req.contact)?;

    let driver = Driver {
        id: DriverId::new(),
        tenant_id,
        name: req.name,
        active: req.active.unwrap_or(true),
        status: req.status.unwrap_or(DriverStatus::Active),
        contact,
        license_expires_at: req.license_expires_at,
        medical_cert_expires_at: req.medical_cert_expires_at,
        created_at: Utc::now(),
    };

    state.drivers.insert(*driver.id.as_uuid(), driver.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(err) = crate::db::actors::upsert_driver(pool, &driver).await {
            tracing::error!(driver = %driver.id, error = %err, "driver mirror write failed");
        }
    }

    Ok((axum::http::StatusCode::CREATED, Json(driver)))
}

/// GET /v1/drivers — List drivers visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/drivers",
    responses((status = 200, description = "Drivers")),
    tag = "actors"
)]
pub(crate) async fn list_drivers(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<Vec<Driver>> {
    let mut drivers: Vec<Driver> = state
        .drivers
        .list()
        .into_iter()
        .filter(|d| caller.can_access_tenant(d.tenant_id))
        .collect();
    drivers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(drivers)
}
