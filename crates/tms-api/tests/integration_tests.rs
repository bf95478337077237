//! # Integration Tests for tms-api
//!
//! Drives the assembled router end-to-end: tender fan-out and cascade,
//! dispatch eligibility gating, inbound SMS resolution with redelivery
//! idempotency, lazy expiry, tenant isolation, authentication, and the
//! degraded-notification path.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use tms_api::auth::SecretToken;
use tms_api::notify::{FailingNotifier, LogNotifier, Notifier, RecordingNotifier};
use tms_api::state::{AppConfig, AppState};
use tms_core::{CarrierId, ExpiryWindow, Money, ShipmentId};
use tms_workflow::{Offer, ShipmentStatus, WorkflowEvent};

// -- Helpers ------------------------------------------------------------------

/// Build the test app with auth disabled, returning the router and a
/// handle to its state for direct inspection.
fn test_app() -> (axum::Router, AppState) {
    let state = AppState::new();
    (tms_api::app(state.clone()), state)
}

/// Build the test app with a custom notifier.
fn test_app_with_notifier(notifier: Arc<dyn Notifier>) -> (axum::Router, AppState) {
    let state = AppState::with_parts(AppConfig::default(), notifier, None);
    (tms_api::app(state.clone()), state)
}

/// Build the test app with auth enabled.
fn test_app_with_auth(token: &str) -> (axum::Router, AppState) {
    let config = AppConfig {
        port: 8080,
        auth_token: Some(SecretToken::new(token)),
        sweep_interval_secs: None,
    };
    let state = AppState::with_parts(config, Arc::new(LogNotifier), None);
    (tms_api::app(state.clone()), state)
}

/// Issue a request and return status + parsed JSON body.
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

/// Create a shipment in QUOTED, returning its id.
async fn seed_shipment(app: &axum::Router, tenant: Uuid) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/v1/shipments",
        Some(json!({
            "reference": "S-100234",
            "origin": "Laredo, TX",
            "destination": "Memphis, TN",
            "tenant_id": tenant,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// Register an active carrier, returning its id.
async fn seed_carrier(app: &axum::Router, tenant: Uuid) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/v1/carriers",
        Some(json!({
            "name": "Overland Freight LLC",
            "contact": "+15550100001",
            "tenant_id": tenant,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// Register a driver, returning its id.
async fn seed_driver(app: &axum::Router, tenant: Uuid, phone: &str, license_days: i64) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/v1/drivers",
        Some(json!({
            "name": "R. Alvarez",
            "contact": phone,
            "license_expires_at": (Utc::now() + Duration::days(license_days)).to_rfc3339(),
            "tenant_id": tenant,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// Extend a tender, returning the created offer id.
async fn seed_tender(app: &axum::Router, shipment: Uuid, carrier: Uuid, cents: i64) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": carrier,
            "kind": "TENDER",
            "amount_cents": cents,
            "expiry_hours": 24,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Uuid::parse_str(body["offer"]["id"].as_str().unwrap()).unwrap()
}

/// Accept an offer directly as its actor.
async fn accept_offer(app: &axum::Router, offer: Uuid, actor: Uuid) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/v1/offers/{offer}/response"),
        Some(json!({ "actor_id": actor, "decision": "ACCEPT" })),
        None,
    )
    .await
}

/// Walk a shipment to BOOKED and extend a dispatch offer to the driver.
/// Returns the dispatch offer id.
async fn seed_dispatch(app: &axum::Router, tenant: Uuid, shipment: Uuid, driver: Uuid) -> Uuid {
    let carrier = seed_carrier(app, tenant).await;
    let tender = seed_tender(app, shipment, carrier, 250_000).await;
    let (status, _) = accept_offer(app, tender, carrier).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": driver,
            "kind": "DISPATCH",
            "message": "Pick up at dock 4 by 06:00",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Uuid::parse_str(body["offer"]["id"].as_str().unwrap()).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_health_probes() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));

    let (status, body) = send(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ready".to_string()));
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_auth_required_when_token_configured() {
    let (app, _) = test_app_with_auth("s3cret");

    let (status, _) = send(&app, "GET", "/v1/shipments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/shipments", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/shipments", None, Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_and_health_bypass_auth() {
    let (app, _) = test_app_with_auth("s3cret");

    let (status, _) = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);

    // The webhook accepts unauthenticated traffic and still answers 200.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/webhooks/sms",
        Some(json!({ "from": "+15550109999", "body": "yes" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_tenant_isolation() {
    let (app, _) = test_app_with_auth("s3cret");
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    // Admin creates a shipment for tenant B.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/shipments",
        Some(json!({
            "reference": "S-200001",
            "origin": "Dallas, TX",
            "destination": "Atlanta, GA",
            "tenant_id": tenant_b,
        })),
        Some("s3cret"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let shipment = body["id"].as_str().unwrap().to_string();

    // An operator for tenant A sees neither the list entry nor the record.
    let operator = format!("operator:{tenant_a}:s3cret");
    let (status, body) = send(&app, "GET", "/v1/shipments", None, Some(&operator)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/v1/shipments/{shipment}"),
        None,
        Some(&operator),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The tenant's own operator sees it.
    let operator_b = format!("operator:{tenant_b}:s3cret");
    let (status, body) = send(&app, "GET", "/v1/shipments", None, Some(&operator_b)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

// -- Tendering ----------------------------------------------------------------

#[tokio::test]
async fn test_create_tender_moves_shipment_onto_the_board() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": carrier,
            "kind": "TENDER",
            "amount_cents": 250_000,
            "expiry_hours": 24,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["offer"]["state"], "OFFERED");
    assert_eq!(body["offer"]["kind"], "TENDER");
    assert_eq!(body["offer"]["amount_cents"], 250_000);
    assert!(body["offer"]["expires_at"].is_string());
    assert_eq!(body["shipment_status"], "TENDERED");
    assert_eq!(body["degraded"], json!(false));
}

#[tokio::test]
async fn test_tender_requires_amount_and_valid_window() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": carrier,
            "kind": "TENDER",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // A window above one week is rejected.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": carrier,
            "kind": "TENDER",
            "amount_cents": 250_000,
            "expiry_hours": 200,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_duplicate_active_tender_conflicts() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;
    seed_tender(&app, shipment, carrier, 250_000).await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": carrier,
            "kind": "TENDER",
            "amount_cents": 260_000,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_accepting_one_tender_cancels_the_others() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier_1 = seed_carrier(&app, tenant).await;
    let carrier_2 = seed_carrier(&app, tenant).await;

    // Two carriers hold OFFERED tenders for the same shipment.
    let offer_1 = seed_tender(&app, shipment, carrier_1, 250_000).await;
    let offer_2 = seed_tender(&app, shipment, carrier_2, 240_000).await;

    let (status, body) = accept_offer(&app, offer_2, carrier_2).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["offer"]["state"], "ACCEPTED");
    assert_eq!(body["shipment_status"], "BOOKED");
    assert_eq!(
        body["cancelled_siblings"],
        json!([offer_1.to_string()])
    );

    // The losing tender is CANCELLED with the winner recorded.
    let (status, body) = send(&app, "GET", &format!("/v1/offers/{offer_1}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "CANCELLED");

    let (_, audit) = send(
        &app,
        "GET",
        &format!("/v1/offers/{offer_1}/audit"),
        None,
        None,
    )
    .await;
    let entries = audit.as_array().unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last["action"], "CANCELLED");
    assert!(last["note"]
        .as_str()
        .unwrap()
        .contains(&format!("superseded by accepted offer {offer_2}")));
}

#[tokio::test]
async fn test_tender_rejection_leaves_shipment_and_siblings_alone() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier_1 = seed_carrier(&app, tenant).await;
    let carrier_2 = seed_carrier(&app, tenant).await;
    let offer_1 = seed_tender(&app, shipment, carrier_1, 250_000).await;
    let offer_2 = seed_tender(&app, shipment, carrier_2, 240_000).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/offers/{offer_1}/response"),
        Some(json!({ "actor_id": carrier_1, "decision": "REJECT", "note": "lane conflict" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offer"]["state"], "REJECTED");
    assert_eq!(body["shipment_status"], "TENDERED");
    assert_eq!(body["cancelled_siblings"].as_array().unwrap().len(), 0);

    let (_, body) = send(&app, "GET", &format!("/v1/offers/{offer_2}"), None, None).await;
    assert_eq!(body["state"], "OFFERED");
}

#[tokio::test]
async fn test_terminal_offer_rejects_further_responses() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;
    let offer = seed_tender(&app, shipment, carrier, 250_000).await;

    let (status, _) = accept_offer(&app, offer, carrier).await;
    assert_eq!(status, StatusCode::OK);

    // Exactly one response wins; the second observes a conflict.
    let (status, _) = accept_offer(&app, offer, carrier).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_direct_response_from_wrong_actor_is_not_found() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;
    let offer = seed_tender(&app, shipment, carrier, 250_000).await;

    let (status, _) = accept_offer(&app, offer, Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The offer is untouched.
    let (_, body) = send(&app, "GET", &format!("/v1/offers/{offer}"), None, None).await;
    assert_eq!(body["state"], "OFFERED");
}

// -- Lazy expiry --------------------------------------------------------------

/// Inject a tender whose response window already elapsed.
fn inject_expired_tender(state: &AppState, shipment: Uuid, carrier: Uuid) -> Uuid {
    let created = Utc::now() - Duration::hours(2);
    let record = state.shipments.get(&shipment).unwrap();
    let offer = Offer::new_tender(
        ShipmentId::from_uuid(shipment),
        record.tenant_id,
        CarrierId::from_uuid(carrier),
        Money::from_cents(250_000).unwrap(),
        ExpiryWindow::from_hours(1).unwrap(),
        created,
    );
    let offer_id = *offer.id.as_uuid();
    state.shipments.update(&shipment, |s| {
        s.status = ShipmentStatus::Tendered;
        s.offers.push(offer.clone());
    });
    state.offer_index.insert(offer_id, shipment);
    offer_id
}

#[tokio::test]
async fn test_accepting_expired_tender_is_410_and_expires_it() {
    let (app, state) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;
    let offer = inject_expired_tender(&state, shipment, carrier);

    let (status, body) = accept_offer(&app, offer, carrier).await;
    assert_eq!(status, StatusCode::GONE, "{body}");
    assert_eq!(body["error"]["code"], "EXPIRED");

    // The failed acceptance moved the offer to EXPIRED as a side effect.
    let (_, body) = send(&app, "GET", &format!("/v1/offers/{offer}"), None, None).await;
    assert_eq!(body["state"], "EXPIRED");
}

#[tokio::test]
async fn test_get_observes_lazy_expiry() {
    let (app, state) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;
    let offer = inject_expired_tender(&state, shipment, carrier);

    let (status, body) = send(&app, "GET", &format!("/v1/offers/{offer}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "EXPIRED");

    // The automatic transition landed in the audit trail.
    let (_, audit) = send(
        &app,
        "GET",
        &format!("/v1/offers/{offer}/audit"),
        None,
        None,
    )
    .await;
    let last = audit.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["action"], "EXPIRED");
    assert_eq!(last["actor"], "system");
}

// -- Dispatch -----------------------------------------------------------------

#[tokio::test]
async fn test_dispatch_to_ineligible_driver_is_422() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    // License expired 30 days ago.
    let driver = seed_driver(&app, tenant, "+15550102222", -30).await;

    // Walk the shipment to BOOKED first so only eligibility can fail.
    let carrier = seed_carrier(&app, tenant).await;
    let tender = seed_tender(&app, shipment, carrier, 250_000).await;
    accept_offer(&app, tender, carrier).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": driver,
            "kind": "DISPATCH",
            "message": "Pick up at dock 4",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("license expired"));
}

#[tokio::test]
async fn test_dispatch_requires_an_accepted_tender() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let driver = seed_driver(&app, tenant, "+15550102222", 200).await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": driver,
            "kind": "DISPATCH",
            "message": "Pick up at dock 4",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_backup_dispatch_offers_survive_an_acceptance() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let primary = seed_driver(&app, tenant, "+15550102222", 200).await;
    let backup = seed_driver(&app, tenant, "+15550103333", 200).await;

    let dispatch_1 = seed_dispatch(&app, tenant, shipment, primary).await;
    let (status, body) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": backup,
            "kind": "DISPATCH",
            "message": "Backup assignment",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let dispatch_2 = Uuid::parse_str(body["offer"]["id"].as_str().unwrap()).unwrap();

    let (status, body) = accept_offer(&app, dispatch_1, primary).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shipment_status"], "CONFIRMED");
    // Dispatch never cascades: the backup stays live.
    assert_eq!(body["cancelled_siblings"].as_array().unwrap().len(), 0);

    let (_, body) = send(&app, "GET", &format!("/v1/offers/{dispatch_2}"), None, None).await;
    assert_eq!(body["state"], "OFFERED");
}

// -- Inbound webhook ----------------------------------------------------------

#[tokio::test]
async fn test_webhook_accept_resolves_the_dispatch() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let driver = seed_driver(&app, tenant, "+15550102222", 200).await;
    let dispatch = seed_dispatch(&app, tenant, shipment, driver).await;

    // The provider formats the number differently; normalization must
    // still correlate it.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/webhooks/sms",
        Some(json!({
            "from": "+1 (555) 010-2222",
            "to": "+15550100000",
            "body": "Accept",
            "providerMessageId": "SM-1001",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["matched_offer_id"], json!(dispatch.to_string()));
    assert_eq!(body["applied_decision"], "ACCEPT");
    assert_eq!(body["already_processed"], json!(false));

    let (_, shipment_body) = send(
        &app,
        "GET",
        &format!("/v1/shipments/{shipment}"),
        None,
        None,
    )
    .await;
    assert_eq!(shipment_body["status"], "CONFIRMED");

    // A redelivered identical webhook is a no-op success.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/webhooks/sms",
        Some(json!({
            "from": "+1 (555) 010-2222",
            "to": "+15550100000",
            "body": "Accept",
            "providerMessageId": "SM-1001",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["already_processed"], json!(true));
}

#[tokio::test]
async fn test_webhook_digit_reject_reverts_the_shipment() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let driver = seed_driver(&app, tenant, "+15550102222", 200).await;
    seed_dispatch(&app, tenant, shipment, driver).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/webhooks/sms",
        Some(json!({ "from": "+15550102222", "body": "2" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["applied_decision"], "REJECT");

    // A declined dispatch reverts the shipment and clears the driver.
    let (_, shipment_body) = send(
        &app,
        "GET",
        &format!("/v1/shipments/{shipment}"),
        None,
        None,
    )
    .await;
    assert_eq!(shipment_body["status"], "TENDERED");
    assert!(shipment_body["assigned_driver"].is_null());
}

#[tokio::test]
async fn test_webhook_unrecognized_is_parked_for_review() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let driver = seed_driver(&app, tenant, "+15550102222", 200).await;
    seed_dispatch(&app, tenant, shipment, driver).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/webhooks/sms",
        Some(json!({ "from": "+15550102222", "body": "maybe" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["reason"], "unrecognized intent");

    // No state was mutated.
    let (_, shipment_body) = send(
        &app,
        "GET",
        &format!("/v1/shipments/{shipment}"),
        None,
        None,
    )
    .await;
    assert_eq!(shipment_body["status"], "DISPATCHED");

    // The message landed in the review queue.
    let (status, review) = send(&app, "GET", "/v1/inbound/review", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = review.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["body"], "maybe");
    assert_eq!(items[0]["reason"], "unrecognized intent");
}

#[tokio::test]
async fn test_webhook_ambiguous_correlation_is_parked() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let driver = seed_driver(&app, tenant, "+15550102222", 200).await;

    // Two shipments hold OFFERED dispatch offers for the same driver.
    let shipment_1 = seed_shipment(&app, tenant).await;
    let shipment_2 = seed_shipment(&app, tenant).await;
    seed_dispatch(&app, tenant, shipment_1, driver).await;
    seed_dispatch(&app, tenant, shipment_2, driver).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/webhooks/sms",
        Some(json!({ "from": "+15550102222", "body": "yes" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert!(body["reason"].as_str().unwrap().contains("2 outstanding"));

    let (_, review) = send(&app, "GET", "/v1/inbound/review", None, None).await;
    assert_eq!(review.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_unknown_number_is_parked() {
    let (app, _) = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/webhooks/sms",
        Some(json!({ "from": "+15550108888", "body": "yes" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["reason"], "no driver registered for this number");
}

#[tokio::test]
async fn test_webhook_malformed_payload_still_answers_200() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/sms")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Queries ------------------------------------------------------------------

#[tokio::test]
async fn test_list_offers_newest_first_with_filters() {
    let (app, _) = test_app();
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier_1 = seed_carrier(&app, tenant).await;
    let carrier_2 = seed_carrier(&app, tenant).await;
    let offer_1 = seed_tender(&app, shipment, carrier_1, 250_000).await;
    let offer_2 = seed_tender(&app, shipment, carrier_2, 240_000).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/offers?shipment_id={shipment}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let offers = body.as_array().unwrap();
    assert_eq!(offers.len(), 2);
    // Newest first.
    assert_eq!(offers[0]["id"], json!(offer_2.to_string()));
    assert_eq!(offers[1]["id"], json!(offer_1.to_string()));

    let (_, body) = send(
        &app,
        "GET",
        &format!("/v1/offers?actor_id={carrier_1}"),
        None,
        None,
    )
    .await;
    let offers = body.as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["id"], json!(offer_1.to_string()));
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/offers"].is_object());
    assert!(body["paths"]["/v1/webhooks/sms"].is_object());
}

// -- Degraded results ---------------------------------------------------------

#[tokio::test]
async fn test_notification_failure_degrades_but_commits() {
    let (app, state) = test_app_with_notifier(Arc::new(FailingNotifier));
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/offers",
        Some(json!({
            "shipment_id": shipment,
            "actor_id": carrier,
            "kind": "TENDER",
            "amount_cents": 250_000,
        })),
        None,
    )
    .await;
    // Committed and reported as success, with the degradation flagged.
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["degraded"], json!(true));
    assert!(!body["warnings"].as_array().unwrap().is_empty());

    // The offer really is committed.
    let record = state.shipments.get(&shipment).unwrap();
    assert_eq!(record.offers.len(), 1);
}

#[tokio::test]
async fn test_events_are_emitted_after_commit() {
    let notifier = Arc::new(RecordingNotifier::new());
    let (app, _) = test_app_with_notifier(notifier.clone());
    let tenant = Uuid::new_v4();
    let shipment = seed_shipment(&app, tenant).await;
    let carrier = seed_carrier(&app, tenant).await;
    let offer = seed_tender(&app, shipment, carrier, 250_000).await;
    accept_offer(&app, offer, carrier).await;

    let events = notifier.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], WorkflowEvent::OfferCreated { .. }));
    match &events[1] {
        WorkflowEvent::OfferAccepted {
            offer_id,
            cancelled_siblings,
            ..
        } => {
            assert_eq!(*offer_id.as_uuid(), offer);
            assert!(cancelled_siblings.is_empty());
        }
        other => panic!("expected OfferAccepted, got: {other:?}"),
    }
}
