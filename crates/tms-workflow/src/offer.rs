//! # Offer State Machine
//!
//! An offer hands one shipment to one external actor: a load **tender**
//! extended to a carrier, or a **dispatch** assignment extended to a
//! driver. The actor answers through an authenticated API call or an
//! unreliable inbound channel; either way the offer resolves through the
//! same state machine.
//!
//! ## States
//!
//! ```text
//!                    ┌──▶ ACCEPTED   (terminal)
//!                    ├──▶ REJECTED   (terminal)
//!      OFFERED ──────┤
//!                    ├──▶ EXPIRED    (terminal, tenders only)
//!                    └──▶ CANCELLED  (terminal)
//! ```
//!
//! OFFERED is the only non-terminal state. Terminal states absorb: no
//! transition out of them is permitted, which is what makes redelivered
//! webhook responses safe to replay against the store.
//!
//! ## Expiry
//!
//! Tenders always carry a response window; dispatch assignments never
//! enforce one, even where outward-facing message text claims otherwise.
//! Expiry is **lazy**: it is observed when an expired offer is accepted
//! (the acceptance fails and the offer moves to EXPIRED in the same
//! step), not enforced by any mandatory background process.
//!
//! ## Audit
//!
//! Every transition — including the automatic EXPIRED and cascade
//! CANCELLED ones — appends exactly one [`AuditEntry`]. The trail is
//! append-only and survives the offer forever; offers are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tms_core::{CarrierId, DriverId, ExpiryWindow, Money, OfferId, ShipmentId, TenantId};

use crate::error::WorkflowError;

// ─── Offer Kind ──────────────────────────────────────────────────────

/// The two offer kinds in the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferKind {
    /// A load tender extended to a carrier.
    Tender,
    /// A dispatch assignment extended to a driver.
    Dispatch,
}

impl OfferKind {
    /// The canonical kind name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tender => "TENDER",
            Self::Dispatch => "DISPATCH",
        }
    }
}

impl std::fmt::Display for OfferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Offer State ─────────────────────────────────────────────────────

/// The lifecycle state of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferState {
    /// Extended to the actor, awaiting a response.
    Offered,
    /// The actor accepted. Terminal.
    Accepted,
    /// The actor declined. Terminal.
    Rejected,
    /// The response window elapsed before acceptance. Terminal.
    Expired,
    /// Withdrawn, typically superseded by a competing accepted offer. Terminal.
    Cancelled,
}

impl OfferState {
    /// The canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Offered => "OFFERED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether this state is terminal. OFFERED is the only state that
    /// is not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Offered)
    }
}

impl std::fmt::Display for OfferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Offer Details (tagged by kind) ──────────────────────────────────

/// Kind-specific offer content.
///
/// A tagged union rather than loose optional fields: a tender cannot
/// exist without an amount and a response window, and a dispatch cannot
/// exist without its assignment message. The actor reference lives
/// inside the union too, so a tender is typed to a [`CarrierId`] and a
/// dispatch to a [`DriverId`] — the mismatch is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDetails {
    /// Load tender content.
    Tender {
        /// The carrier the tender is extended to.
        carrier_id: CarrierId,
        /// The offered rate.
        amount: Money,
        /// When the response window elapses. Always present for tenders.
        expires_at: DateTime<Utc>,
    },
    /// Dispatch assignment content.
    Dispatch {
        /// The driver the assignment is extended to.
        driver_id: DriverId,
        /// Assignment message relayed to the driver.
        message: String,
    },
}

impl OfferDetails {
    /// The offer kind this content belongs to.
    pub fn kind(&self) -> OfferKind {
        match self {
            Self::Tender { .. } => OfferKind::Tender,
            Self::Dispatch { .. } => OfferKind::Dispatch,
        }
    }

    /// The expiry instant, if this kind enforces one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Tender { expires_at, .. } => Some(*expires_at),
            Self::Dispatch { .. } => None,
        }
    }

    /// The target actor as an opaque UUID, for display and persistence.
    pub fn actor_uuid(&self) -> uuid::Uuid {
        match self {
            Self::Tender { carrier_id, .. } => *carrier_id.as_uuid(),
            Self::Dispatch { driver_id, .. } => *driver_id.as_uuid(),
        }
    }
}

// ─── Audit Trail ─────────────────────────────────────────────────────

/// The action recorded by one audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Offer created and extended to the actor.
    Created,
    /// Offer accepted by the actor.
    Accepted,
    /// Offer rejected by the actor.
    Rejected,
    /// Response window elapsed (automatic).
    Expired,
    /// Offer withdrawn (automatic on cascade, or operator-initiated).
    Cancelled,
}

impl AuditAction {
    /// The canonical action name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// One entry in an offer's append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Who caused it — an actor id, an operator, or `"system"` for
    /// automatic transitions.
    pub actor: String,
    /// Free-text context (response note, cascade reason, provider
    /// message id).
    pub note: Option<String>,
}

// ─── Offer ───────────────────────────────────────────────────────────

/// Actor recorded for automatic transitions (expiry, cascade).
pub const SYSTEM_ACTOR: &str = "system";

/// An offer extended to one external actor for one shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Unique offer identifier.
    pub id: OfferId,
    /// The shipment this offer belongs to.
    pub shipment_id: ShipmentId,
    /// The tenant that owns the shipment and the actor.
    pub tenant_id: TenantId,
    /// Kind-specific content, including the target actor.
    pub details: OfferDetails,
    /// Current lifecycle state.
    pub state: OfferState,
    /// When the actor's response was applied, if any.
    pub responded_at: Option<DateTime<Utc>>,
    /// Who supplied the response.
    pub responded_by: Option<String>,
    /// Free-text note accompanying the response.
    pub response_note: Option<String>,
    /// Append-only transition log.
    pub audit_trail: Vec<AuditEntry>,
    /// When the offer was created.
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Create a tender extended to a carrier, in the OFFERED state.
    pub fn new_tender(
        shipment_id: ShipmentId,
        tenant_id: TenantId,
        carrier_id: CarrierId,
        amount: Money,
        window: ExpiryWindow,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            shipment_id,
            tenant_id,
            OfferDetails::Tender {
                carrier_id,
                amount,
                expires_at: window.expires_at(now),
            },
            now,
        )
    }

    /// Create a dispatch assignment extended to a driver, in the OFFERED
    /// state.
    pub fn new_dispatch(
        shipment_id: ShipmentId,
        tenant_id: TenantId,
        driver_id: DriverId,
        message: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            shipment_id,
            tenant_id,
            OfferDetails::Dispatch { driver_id, message },
            now,
        )
    }

    fn new(
        shipment_id: ShipmentId,
        tenant_id: TenantId,
        details: OfferDetails,
        now: DateTime<Utc>,
    ) -> Self {
        let actor = details.actor_uuid().to_string();
        Self {
            id: OfferId::new(),
            shipment_id,
            tenant_id,
            details,
            state: OfferState::Offered,
            responded_at: None,
            responded_by: None,
            response_note: None,
            audit_trail: vec![AuditEntry {
                action: AuditAction::Created,
                timestamp: now,
                actor,
                note: None,
            }],
            created_at: now,
        }
    }

    /// The offer kind.
    pub fn kind(&self) -> OfferKind {
        self.details.kind()
    }

    /// The carrier this tender targets, if it is a tender.
    pub fn carrier_id(&self) -> Option<CarrierId> {
        match &self.details {
            OfferDetails::Tender { carrier_id, .. } => Some(*carrier_id),
            OfferDetails::Dispatch { .. } => None,
        }
    }

    /// The driver this dispatch targets, if it is a dispatch.
    pub fn driver_id(&self) -> Option<DriverId> {
        match &self.details {
            OfferDetails::Dispatch { driver_id, .. } => Some(*driver_id),
            OfferDetails::Tender { .. } => None,
        }
    }

    /// Whether the offer is OFFERED with an elapsed response window.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.state == OfferState::Offered
            && self
                .details
                .expires_at()
                .is_some_and(|deadline| deadline < now)
    }

    /// Whether this offer blocks creation of a new tender for the given
    /// carrier on the same shipment (at most one OFFERED tender per
    /// carrier per shipment).
    pub fn blocks_new_tender(&self, carrier: CarrierId) -> bool {
        self.state == OfferState::Offered && self.carrier_id() == Some(carrier)
    }

    /// Whether this offer blocks creation of a new dispatch for the
    /// given driver on the same shipment (at most one OFFERED or
    /// ACCEPTED dispatch per driver per shipment).
    pub fn blocks_new_dispatch(&self, driver: DriverId) -> bool {
        matches!(self.state, OfferState::Offered | OfferState::Accepted)
            && self.driver_id() == Some(driver)
    }

    /// Attempt a state transition with runtime validation.
    ///
    /// Rules:
    /// - The only legal transitions are OFFERED → {ACCEPTED, REJECTED,
    ///   EXPIRED, CANCELLED}. Anything else is
    ///   [`WorkflowError::InvalidTransition`].
    /// - Accepting past the response window fails with
    ///   [`WorkflowError::Expired`] **and** moves the offer to EXPIRED
    ///   in the same step (lazy expiry).
    ///
    /// On success the offer records who responded and appends one audit
    /// entry. Automatic transitions pass [`SYSTEM_ACTOR`] as `responder`.
    pub fn try_transition(
        &mut self,
        to: OfferState,
        responder: &str,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if self.state.is_terminal() || to == OfferState::Offered {
            return Err(WorkflowError::InvalidTransition {
                offer_id: self.id,
                from: self.state,
                to,
            });
        }

        if to == OfferState::Accepted {
            if let Some(deadline) = self.details.expires_at() {
                if deadline < now {
                    self.apply(
                        OfferState::Expired,
                        SYSTEM_ACTOR,
                        Some("response window elapsed before acceptance".to_string()),
                        now,
                    );
                    return Err(WorkflowError::Expired {
                        offer_id: self.id,
                        expired_at: deadline,
                    });
                }
            }
        }

        self.apply(to, responder, note, now);
        Ok(())
    }

    /// Record the transition. Caller has already validated it.
    fn apply(&mut self, to: OfferState, responder: &str, note: Option<String>, now: DateTime<Utc>) {
        let action = match to {
            OfferState::Accepted => AuditAction::Accepted,
            OfferState::Rejected => AuditAction::Rejected,
            OfferState::Expired => AuditAction::Expired,
            OfferState::Cancelled => AuditAction::Cancelled,
            OfferState::Offered => unreachable!("validated by try_transition"),
        };

        // Actor-supplied responses are recorded on the offer itself;
        // automatic transitions only touch the audit trail.
        if matches!(to, OfferState::Accepted | OfferState::Rejected) {
            self.responded_at = Some(now);
            self.responded_by = Some(responder.to_string());
            self.response_note = note.clone();
        }

        self.audit_trail.push(AuditEntry {
            action,
            timestamp: now,
            actor: responder.to_string(),
            note,
        });
        self.state = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
