//! # OpenAPI Document
//!
//! OpenAPI 3 spec auto-generated from handler annotations via utoipa,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// The assembled OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TMS Offer Workflow API",
        description = "Freight-brokerage offer/response workflow: load tendering, driver dispatch, inbound SMS resolution, and the audit surface.",
    ),
    paths(
        crate::routes::offers::create_offer,
        crate::routes::offers::respond,
        crate::routes::offers::get_offer,
        crate::routes::offers::list_offers,
        crate::routes::offers::get_audit,
        crate::routes::webhook::inbound_sms,
        crate::routes::webhook::list_review_queue,
        crate::routes::shipments::create_shipment,
        crate::routes::shipments::list_shipments,
        crate::routes::shipments::get_shipment,
        crate::routes::actors::create_carrier,
        crate::routes::actors::list_carriers,
        crate::routes::actors::create_driver,
        crate::routes::actors::list_drivers,
    ),
    components(schemas(
        crate::routes::offers::CreateOfferRequest,
        crate::routes::offers::RespondRequest,
        crate::routes::offers::OfferView,
        crate::routes::offers::CreateOfferResponse,
        crate::routes::offers::ResolutionResponse,
        crate::routes::offers::AuditEntryView,
        crate::routes::webhook::InboundSmsRequest,
        crate::routes::shipments::CreateShipmentRequest,
        crate::routes::actors::CreateCarrierRequest,
        crate::routes::actors::CreateDriverRequest,
        crate::orchestration::InboundOutcome,
        crate::orchestration::Decision,
        crate::state::ShipmentRecord,
        crate::state::ReviewItem,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "offers", description = "Offer/response workflow"),
        (name = "webhook", description = "Inbound SMS resolution"),
        (name = "shipments", description = "Shipment plumbing"),
        (name = "actors", description = "Carrier and driver registries"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

/// GET /openapi.json — the generated spec.
async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
