//! # Workflow Orchestration
//!
//! The transactional coordinator for the offer/response workflow. Every
//! write operation follows the same shape:
//!
//! 1. **Pre-flight** — resolve the shipment and actor (tenant-scoped),
//!    run the eligibility gate, validate kind-specific input.
//! 2. **Atomic commit** — one [`Store::try_update`] closure on the
//!    owning shipment applies the offer mutation, the cascade, and the
//!    coupled shipment-status write under a single writer lock. No
//!    intermediate state is observable; the loser of a concurrent race
//!    sees `InvalidTransition` or the idempotent no-op path.
//! 3. **Post-commit** — mirror the aggregate to Postgres (when
//!    configured), append hash-chained audit events, and hand the
//!    domain event to the notifier. Failures here degrade the result;
//!    they never un-commit it.
//!
//! [`Store::try_update`]: crate::state::Store::try_update

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tms_core::{CarrierId, ContactNumber, DriverId, ExpiryWindow, Money, OfferId};
use tms_workflow::{
    cancel_competing, check_carrier, check_driver, classify_intent, InboundMessage, Offer,
    OfferKind, OfferState, ResponseIntent, ShipmentStatus, WorkflowError, WorkflowEvent,
};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::notify;
use crate::state::{AppState, ReviewItem, ShipmentRecord};

// ---------------------------------------------------------------------------
// Commands and envelopes
// ---------------------------------------------------------------------------

/// A request to extend an offer.
#[derive(Debug, Clone)]
pub struct CreateOfferCommand {
    /// Target shipment.
    pub shipment_id: Uuid,
    /// Target actor — a carrier for TENDER, a driver for DISPATCH.
    pub actor_id: Uuid,
    /// Offer kind.
    pub kind: OfferKind,
    /// Tender rate in minor units. Required for TENDER.
    pub amount_cents: Option<i64>,
    /// Assignment message. Required for DISPATCH.
    pub message: Option<String>,
    /// Tender response window in hours (1..=168). Defaults to 24.
    pub expiry_hours: Option<i64>,
}

/// An actor's decision on an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Take the offer.
    Accept,
    /// Decline the offer.
    Reject,
}

impl Decision {
    fn target_state(self) -> OfferState {
        match self {
            Self::Accept => OfferState::Accepted,
            Self::Reject => OfferState::Rejected,
        }
    }
}

/// Result of a committed offer creation.
#[derive(Debug, Clone)]
pub struct OfferEnvelope {
    /// The created offer.
    pub offer: Offer,
    /// Shipment status after the coupled write.
    pub shipment_status: ShipmentStatus,
    /// Post-commit warnings (mirror or notification failures).
    pub warnings: Vec<String>,
}

/// Result of a committed response resolution.
#[derive(Debug, Clone)]
pub struct ResolutionEnvelope {
    /// The resolved offer.
    pub offer: Offer,
    /// Sibling offers cancelled in the same commit.
    pub cancelled_siblings: Vec<OfferId>,
    /// Shipment status after the coupled write.
    pub shipment_status: ShipmentStatus,
    /// Post-commit warnings (mirror or notification failures).
    pub warnings: Vec<String>,
}

/// Outcome of an inbound webhook message. Always reported with HTTP 200
/// — failure reasons ride in the body so the provider never retries.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InboundOutcome {
    /// Whether the message was applied (or was a safe replay).
    pub success: bool,
    /// The offer the message resolved to, if any.
    #[schema(value_type = Option<Uuid>)]
    pub matched_offer_id: Option<OfferId>,
    /// The decision that was applied, if any.
    #[schema(value_type = Option<String>)]
    pub applied_decision: Option<ResponseIntent>,
    /// True when the referenced offer was already resolved and the
    /// message was treated as a redelivery no-op.
    pub already_processed: bool,
    /// Why the message could not be applied, when it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Offer creation
// ---------------------------------------------------------------------------

/// Validated kind-specific creation input.
enum CreationInput {
    Tender {
        carrier_id: CarrierId,
        amount: Money,
        window: ExpiryWindow,
    },
    Dispatch {
        driver_id: DriverId,
        message: String,
    },
}

/// Extend an offer for a shipment to an eligible actor.
pub async fn create_offer(
    state: &AppState,
    caller: &CallerIdentity,
    cmd: CreateOfferCommand,
) -> Result<OfferEnvelope, AppError> {
    let now = Utc::now();
    let shipment = visible_shipment(state, caller, cmd.shipment_id)?;

    // Pre-flight: actor resolution + eligibility gate. Evaluated once,
    // at creation time; response-time checks belong to the state machine.
    let input = match cmd.kind {
        OfferKind::Tender => {
            let carrier = state
                .carriers
                .get(&cmd.actor_id)
                .filter(|c| c.tenant_id == shipment.tenant_id)
                .ok_or_else(|| not_found("carrier", cmd.actor_id))?;
            let gate = check_carrier(&carrier);
            if !gate.eligible {
                return Err(WorkflowError::Ineligible {
                    actor: carrier.id.to_string(),
                    reason: gate.reason.unwrap_or_default(),
                }
                .into());
            }
            let cents = cmd.amount_cents.ok_or_else(|| {
                AppError::Validation("amount_cents is required for TENDER offers".to_string())
            })?;
            let window = match cmd.expiry_hours {
                Some(hours) => ExpiryWindow::from_hours(hours)?,
                None => ExpiryWindow::default(),
            };
            CreationInput::Tender {
                carrier_id: carrier.id,
                amount: Money::from_cents(cents)?,
                window,
            }
        }
        OfferKind::Dispatch => {
            let driver = state
                .drivers
                .get(&cmd.actor_id)
                .filter(|d| d.tenant_id == shipment.tenant_id)
                .ok_or_else(|| not_found("driver", cmd.actor_id))?;
            let gate = check_driver(&driver, now);
            if !gate.eligible {
                return Err(WorkflowError::Ineligible {
                    actor: driver.id.to_string(),
                    reason: gate.reason.unwrap_or_default(),
                }
                .into());
            }
            let message = cmd.message.clone().filter(|m| !m.trim().is_empty()).ok_or_else(|| {
                AppError::Validation("message is required for DISPATCH offers".to_string())
            })?;
            CreationInput::Dispatch {
                driver_id: driver.id,
                message,
            }
        }
    };

    // Atomic commit on the owning shipment.
    let result = state.shipments.try_update(&cmd.shipment_id, |s| {
        match &input {
            CreationInput::Tender {
                carrier_id,
                amount,
                window,
            } => {
                if !s.status.allows_tender() {
                    return Err(WorkflowError::WrongShipmentState {
                        status: s.status,
                        kind: OfferKind::Tender,
                        requirement: "QUOTED or TENDERED",
                    });
                }
                if s.offers.iter().any(|o| o.blocks_new_tender(*carrier_id)) {
                    return Err(WorkflowError::DuplicateOffer {
                        kind: OfferKind::Tender,
                        actor: carrier_id.to_string(),
                        shipment: s.id.to_string(),
                    });
                }
                let offer =
                    Offer::new_tender(s.id, s.tenant_id, *carrier_id, *amount, *window, now);
                // The first tender moves the shipment onto the board.
                if s.status == ShipmentStatus::Quoted {
                    s.status = ShipmentStatus::Tendered;
                }
                s.offers.push(offer.clone());
                s.updated_at = now;
                Ok((offer, s.status))
            }
            CreationInput::Dispatch { driver_id, message } => {
                if !s
                    .offers
                    .iter()
                    .any(|o| o.kind() == OfferKind::Tender && o.state == OfferState::Accepted)
                {
                    return Err(WorkflowError::WrongShipmentState {
                        status: s.status,
                        kind: OfferKind::Dispatch,
                        requirement: "an accepted tender",
                    });
                }
                if !s.status.allows_dispatch() {
                    return Err(WorkflowError::WrongShipmentState {
                        status: s.status,
                        kind: OfferKind::Dispatch,
                        requirement: "BOOKED, TENDERED, or DISPATCHED",
                    });
                }
                if s.offers.iter().any(|o| o.blocks_new_dispatch(*driver_id)) {
                    return Err(WorkflowError::DuplicateOffer {
                        kind: OfferKind::Dispatch,
                        actor: driver_id.to_string(),
                        shipment: s.id.to_string(),
                    });
                }
                let offer =
                    Offer::new_dispatch(s.id, s.tenant_id, *driver_id, message.clone(), now);
                s.status = ShipmentStatus::Dispatched;
                s.assigned_driver = Some(*driver_id);
                s.offers.push(offer.clone());
                s.updated_at = now;
                Ok((offer, s.status))
            }
        }
    });

    let (offer, shipment_status) = match result {
        None => return Err(not_found("shipment", cmd.shipment_id)),
        Some(Err(err)) => return Err(err.into()),
        Some(Ok(ok)) => ok,
    };

    state
        .offer_index
        .insert(*offer.id.as_uuid(), cmd.shipment_id);

    // Post-commit: durability mirror, then notification.
    let mut warnings = mirror_commit(state, cmd.shipment_id, &[offer.clone()]).await;
    let event = WorkflowEvent::OfferCreated {
        offer_id: offer.id,
        shipment_id: offer.shipment_id,
        kind: offer.kind(),
        occurred_at: now,
    };
    warnings.extend(notify::dispatch(&state.notifier, &event));

    Ok(OfferEnvelope {
        offer,
        shipment_status,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Response resolution
// ---------------------------------------------------------------------------

/// Apply a direct (authenticated) accept/reject response to an offer.
pub async fn respond(
    state: &AppState,
    caller: &CallerIdentity,
    offer_id: Uuid,
    actor_id: Uuid,
    decision: Decision,
    note: Option<String>,
) -> Result<ResolutionEnvelope, AppError> {
    let now = Utc::now();
    let shipment_uuid = state
        .offer_index
        .get(&offer_id)
        .ok_or_else(|| not_found("offer", offer_id))?;
    let shipment = visible_shipment_for_offer(state, caller, shipment_uuid, offer_id)?;

    // The actor on the offer must be the one responding. A mismatch is
    // reported as NOT_FOUND so offer existence is not leaked.
    let offer = shipment
        .offer(&OfferId::from_uuid(offer_id))
        .ok_or_else(|| not_found("offer", offer_id))?;
    if offer.details.actor_uuid() != actor_id {
        return Err(not_found("offer", offer_id));
    }

    let responder = actor_id.to_string();
    match resolve_offer(state, shipment_uuid, offer_id, decision.target_state(), &responder, note, now) {
        Ok((offer, cancelled, shipment_status)) => {
            let mut touched: Vec<Offer> = vec![offer.clone()];
            if let Some(snapshot) = state.shipments.get(&shipment_uuid) {
                touched.extend(
                    snapshot
                        .offers
                        .iter()
                        .filter(|o| cancelled.contains(&o.id))
                        .cloned(),
                );
            }
            let mut warnings = mirror_commit(state, shipment_uuid, &touched).await;
            let event = match decision {
                Decision::Accept => WorkflowEvent::OfferAccepted {
                    offer_id: offer.id,
                    shipment_id: offer.shipment_id,
                    kind: offer.kind(),
                    cancelled_siblings: cancelled.clone(),
                    occurred_at: now,
                },
                Decision::Reject => WorkflowEvent::OfferRejected {
                    offer_id: offer.id,
                    shipment_id: offer.shipment_id,
                    kind: offer.kind(),
                    occurred_at: now,
                },
            };
            warnings.extend(notify::dispatch(&state.notifier, &event));

            Ok(ResolutionEnvelope {
                offer,
                cancelled_siblings: cancelled,
                shipment_status,
                warnings,
            })
        }
        Err(err) => {
            if let WorkflowError::Expired { offer_id, .. } = &err {
                // Lazy expiry: the failed acceptance moved the offer to
                // EXPIRED. Persist and announce that before surfacing 410.
                commit_observed_expiry(state, shipment_uuid, *offer_id, now).await;
            }
            Err(err.into())
        }
    }
}

/// Apply a transition to one offer inside its shipment's critical
/// section: the transition itself, the cascade, and the coupled
/// shipment-status write commit together or not at all.
fn resolve_offer(
    state: &AppState,
    shipment_uuid: Uuid,
    offer_id: Uuid,
    target: OfferState,
    responder: &str,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<(Offer, Vec<OfferId>, ShipmentStatus), WorkflowError> {
    let typed_offer_id = OfferId::from_uuid(offer_id);
    let result = state.shipments.try_update(&shipment_uuid, |s| {
        let offer = s
            .offers
            .iter_mut()
            .find(|o| o.id == typed_offer_id)
            .ok_or_else(|| WorkflowError::NotFound {
                resource: "offer",
                id: offer_id.to_string(),
            })?;

        offer.try_transition(target, responder, note.clone(), now)?;
        let resolved = offer.clone();

        let cancelled = if target == OfferState::Accepted {
            cancel_competing(&mut s.offers, typed_offer_id, now)
        } else {
            Vec::new()
        };

        match (resolved.kind(), target) {
            (OfferKind::Tender, OfferState::Accepted) => {
                s.status = ShipmentStatus::Booked;
                s.assigned_carrier = resolved.carrier_id();
            }
            (OfferKind::Dispatch, OfferState::Accepted) => {
                s.status = ShipmentStatus::Confirmed;
                s.assigned_driver = resolved.driver_id();
            }
            (OfferKind::Dispatch, OfferState::Rejected) => {
                // A declined dispatch puts the shipment back on the
                // dispatch board and clears the planned driver.
                s.status = ShipmentStatus::Tendered;
                s.assigned_driver = None;
            }
            // A declined tender leaves the shipment awaiting other
            // tenders; EXPIRED and CANCELLED never touch the shipment.
            _ => {}
        }

        s.updated_at = now;
        Ok((resolved, cancelled, s.status))
    });

    match result {
        None => Err(WorkflowError::NotFound {
            resource: "shipment",
            id: shipment_uuid.to_string(),
        }),
        Some(outcome) => outcome,
    }
}

// ---------------------------------------------------------------------------
// Inbound webhook resolution
// ---------------------------------------------------------------------------

/// Resolve a raw inbound message into a workflow effect.
///
/// Never returns an error: the webhook contract is "always 200", so
/// every failure mode becomes a reported reason. Unmatched and
/// ambiguous messages are parked for manual review, not dropped.
pub async fn apply_inbound(state: &AppState, msg: InboundMessage) -> InboundOutcome {
    let now = Utc::now();

    let intent = classify_intent(&msg.body);
    let decision = match intent {
        ResponseIntent::Accept => Decision::Accept,
        ResponseIntent::Reject => Decision::Reject,
        ResponseIntent::Unrecognized => {
            return park(state, &msg, "unrecognized intent", now);
        }
    };

    let from = match ContactNumber::new(&msg.from) {
        Ok(number) => number,
        Err(_) => return park(state, &msg, "unparseable source number", now),
    };

    // Correlate: drivers registered under this number, then their
    // dispatch offers. The driver's tenant scopes the search.
    let driver_ids: Vec<DriverId> = state
        .drivers
        .list()
        .into_iter()
        .filter(|d| d.contact == from)
        .map(|d| d.id)
        .collect();
    if driver_ids.is_empty() {
        return park(state, &msg, "no driver registered for this number", now);
    }

    let mut offered: Vec<(Uuid, Offer)> = Vec::new();
    let mut resolved: Vec<Offer> = Vec::new();
    for shipment in state.shipments.list() {
        for offer in &shipment.offers {
            let Some(driver) = offer.driver_id() else {
                continue;
            };
            if !driver_ids.contains(&driver) {
                continue;
            }
            if offer.state == OfferState::Offered {
                offered.push((*shipment.id.as_uuid(), offer.clone()));
            } else {
                resolved.push(offer.clone());
            }
        }
    }

    match offered.len() {
        1 => {}
        0 => {
            // Redelivery of an already-resolved response is a no-op
            // success, not an error — the channel is at-least-once.
            if let Some(last) = resolved
                .iter()
                .max_by_key(|o| o.responded_at.unwrap_or(o.created_at))
            {
                return InboundOutcome {
                    success: true,
                    matched_offer_id: Some(last.id),
                    applied_decision: None,
                    already_processed: true,
                    reason: Some("offer already resolved".to_string()),
                };
            }
            return park(state, &msg, "no outstanding dispatch offer for this number", now);
        }
        n => {
            let reason = WorkflowError::Ambiguous {
                contact: from.to_string(),
                candidates: n,
            }
            .to_string();
            return park(state, &msg, &reason, now);
        }
    }

    let (shipment_uuid, offer) = offered.remove(0);
    let note = match &msg.provider_message_id {
        Some(id) => format!("via SMS (provider message {id})"),
        None => "via SMS".to_string(),
    };

    match resolve_offer(
        state,
        shipment_uuid,
        *offer.id.as_uuid(),
        decision.target_state(),
        &offer.details.actor_uuid().to_string(),
        Some(note),
        now,
    ) {
        Ok((resolved_offer, cancelled, _status)) => {
            let mut touched: Vec<Offer> = vec![resolved_offer.clone()];
            if let Some(snapshot) = state.shipments.get(&shipment_uuid) {
                touched.extend(
                    snapshot
                        .offers
                        .iter()
                        .filter(|o| cancelled.contains(&o.id))
                        .cloned(),
                );
            }
            let warnings = mirror_commit(state, shipment_uuid, &touched).await;
            for warning in &warnings {
                tracing::warn!(%warning, "inbound resolution committed with warnings");
            }
            let event = match decision {
                Decision::Accept => WorkflowEvent::OfferAccepted {
                    offer_id: resolved_offer.id,
                    shipment_id: resolved_offer.shipment_id,
                    kind: resolved_offer.kind(),
                    cancelled_siblings: cancelled,
                    occurred_at: now,
                },
                Decision::Reject => WorkflowEvent::OfferRejected {
                    offer_id: resolved_offer.id,
                    shipment_id: resolved_offer.shipment_id,
                    kind: resolved_offer.kind(),
                    occurred_at: now,
                },
            };
            if let Some(warning) = notify::dispatch(&state.notifier, &event) {
                tracing::warn!(%warning, "inbound notification degraded");
            }

            InboundOutcome {
                success: true,
                matched_offer_id: Some(resolved_offer.id),
                applied_decision: Some(intent),
                already_processed: false,
                reason: None,
            }
        }
        // Lost a race against a concurrent resolution: the offer is
        // terminal now, which for an at-least-once channel is a replay.
        Err(WorkflowError::InvalidTransition { .. }) => InboundOutcome {
            success: true,
            matched_offer_id: Some(offer.id),
            applied_decision: None,
            already_processed: true,
            reason: Some("offer already resolved".to_string()),
        },
        Err(err) => park(state, &msg, &err.to_string(), now),
    }
}

/// Park an inbound message for manual review and report the failure.
fn park(state: &AppState, msg: &InboundMessage, reason: &str, now: DateTime<Utc>) -> InboundOutcome {
    let item = ReviewItem {
        id: Uuid::new_v4(),
        received_at: now,
        from: msg.from.clone(),
        body: msg.body.clone(),
        provider_message_id: msg.provider_message_id.clone(),
        reason: reason.to_string(),
    };
    tracing::warn!(from = %item.from, reason, "inbound message parked for manual review");
    state.review_queue.insert(item.id, item);

    let event = WorkflowEvent::InboundUnmatched {
        from: msg.from.clone(),
        reason: reason.to_string(),
        occurred_at: now,
    };
    if let Some(warning) = notify::dispatch(&state.notifier, &event) {
        tracing::warn!(%warning, "review-queue notification degraded");
    }

    InboundOutcome {
        success: false,
        matched_offer_id: None,
        applied_decision: None,
        already_processed: false,
        reason: Some(reason.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// Transition every OFFERED tender whose window has elapsed to EXPIRED.
///
/// This is the optional sweep; lazy observation on read and response
/// remains authoritative without it. Returns the number of offers
/// expired.
pub async fn sweep_expired(state: &AppState) -> usize {
    let now = Utc::now();
    let mut expired = 0usize;

    for shipment in state.shipments.list() {
        for offer in &shipment.offers {
            if !offer.is_expired(now) {
                continue;
            }
            if observe_expiry(state, *shipment.id.as_uuid(), offer.id, now) {
                commit_observed_expiry(state, *shipment.id.as_uuid(), offer.id, now).await;
                expired += 1;
            }
        }
    }

    if expired > 0 {
        tracing::info!(count = expired, "expiry sweep transitioned stale offers");
    }
    expired
}

/// Move one offer to EXPIRED under the shipment lock. Returns whether
/// this call performed the transition (a concurrent resolution may have
/// won).
fn observe_expiry(state: &AppState, shipment_uuid: Uuid, offer_id: OfferId, now: DateTime<Utc>) -> bool {
    let result = state.shipments.try_update(&shipment_uuid, |s| {
        let offer = s
            .offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or(())?;
        if !offer.is_expired(now) {
            return Err(());
        }
        offer
            .try_transition(
                OfferState::Expired,
                tms_workflow::offer::SYSTEM_ACTOR,
                Some("response window elapsed".to_string()),
                now,
            )
            .map_err(|_| ())?;
        s.updated_at = now;
        Ok(())
    });
    matches!(result, Some(Ok(())))
}

/// Mirror and announce an expiry that was just recorded in-memory.
async fn commit_observed_expiry(
    state: &AppState,
    shipment_uuid: Uuid,
    offer_id: OfferId,
    now: DateTime<Utc>,
) {
    let Some(snapshot) = state.shipments.get(&shipment_uuid) else {
        return;
    };
    let Some(offer) = snapshot.offer(&offer_id).cloned() else {
        return;
    };
    let warnings = mirror_commit(state, shipment_uuid, &[offer.clone()]).await;
    for warning in warnings {
        tracing::warn!(%warning, "expiry committed with warnings");
    }
    let event = WorkflowEvent::OfferExpired {
        offer_id,
        shipment_id: offer.shipment_id,
        occurred_at: now,
    };
    if let Some(warning) = notify::dispatch(&state.notifier, &event) {
        tracing::warn!(%warning, "expiry notification degraded");
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch one offer, observing lazy expiry: an OFFERED tender read past
/// its window is transitioned to EXPIRED before being returned.
pub async fn get_offer(
    state: &AppState,
    caller: &CallerIdentity,
    offer_id: Uuid,
) -> Result<Offer, AppError> {
    let now = Utc::now();
    let shipment_uuid = state
        .offer_index
        .get(&offer_id)
        .ok_or_else(|| not_found("offer", offer_id))?;
    let shipment = visible_shipment_for_offer(state, caller, shipment_uuid, offer_id)?;
    let typed = OfferId::from_uuid(offer_id);
    let offer = shipment
        .offer(&typed)
        .cloned()
        .ok_or_else(|| not_found("offer", offer_id))?;

    if offer.is_expired(now) {
        if observe_expiry(state, shipment_uuid, typed, now) {
            commit_observed_expiry(state, shipment_uuid, typed, now).await;
        }
        // Re-read either way: a concurrent caller may have observed the
        // expiry (or resolved the offer) first.
        if let Some(refreshed) = state
            .shipments
            .get(&shipment_uuid)
            .and_then(|s| s.offer(&typed).cloned())
        {
            return Ok(refreshed);
        }
    }

    Ok(offer)
}

/// List offers visible to the caller, newest first, optionally filtered
/// by shipment or actor.
pub fn list_offers(
    state: &AppState,
    caller: &CallerIdentity,
    shipment_id: Option<Uuid>,
    actor_id: Option<Uuid>,
) -> Vec<Offer> {
    let mut offers: Vec<Offer> = state
        .shipments
        .list()
        .into_iter()
        .filter(|s| caller.can_access_tenant(s.tenant_id))
        .filter(|s| shipment_id.map_or(true, |id| *s.id.as_uuid() == id))
        .flat_map(|s| s.offers)
        .filter(|o| actor_id.map_or(true, |id| o.details.actor_uuid() == id))
        .collect();
    offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    offers
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(resource: &'static str, id: Uuid) -> AppError {
    AppError::from(WorkflowError::NotFound {
        resource,
        id: id.to_string(),
    })
}

/// Resolve a shipment the caller may see, by shipment id.
fn visible_shipment(
    state: &AppState,
    caller: &CallerIdentity,
    shipment_id: Uuid,
) -> Result<ShipmentRecord, AppError> {
    state
        .shipments
        .get(&shipment_id)
        .filter(|s| caller.can_access_tenant(s.tenant_id))
        .ok_or_else(|| not_found("shipment", shipment_id))
}

/// Resolve a shipment the caller may see, reporting failures against
/// the offer id so cross-tenant probes cannot distinguish "no such
/// offer" from "not yours".
fn visible_shipment_for_offer(
    state: &AppState,
    caller: &CallerIdentity,
    shipment_uuid: Uuid,
    offer_id: Uuid,
) -> Result<ShipmentRecord, AppError> {
    state
        .shipments
        .get(&shipment_uuid)
        .filter(|s| caller.can_access_tenant(s.tenant_id))
        .ok_or_else(|| not_found("offer", offer_id))
}

/// Mirror a committed aggregate to Postgres: the shipment row, its
/// offers, and one hash-chained audit event per touched offer. Failures
/// are returned as warnings — in-memory state is already committed.
async fn mirror_commit(state: &AppState, shipment_uuid: Uuid, touched: &[Offer]) -> Vec<String> {
    let Some(pool) = &state.db_pool else {
        return Vec::new();
    };
    let Some(snapshot) = state.shipments.get(&shipment_uuid) else {
        return Vec::new();
    };

    let mut warnings = Vec::new();
    if let Err(err) = crate::db::shipments::persist(pool, &snapshot).await {
        tracing::error!(shipment = %snapshot.id, error = %err, "shipment mirror write failed");
        warnings.push(format!("durability mirror write failed: {err}"));
    }
    for offer in touched {
        if let Err(err) = crate::db::audit::append_offer_transition(pool, offer).await {
            tracing::error!(offer = %offer.id, error = %err, "audit mirror write failed");
            warnings.push(format!("audit mirror write failed: {err}"));
        }
    }
    warnings
}
