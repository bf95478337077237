//! # Domain Events
//!
//! Events emitted by the coordinator **after** a workflow operation has
//! committed. Delivery (SMS, EDI, email) is a separate dispatcher's
//! concern — workflow correctness never depends on a notifier being
//! reachable, and a failed delivery never rolls back committed state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tms_core::{OfferId, ShipmentId};

use crate::offer::OfferKind;

/// A domain event describing one committed workflow outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowEvent {
    /// An offer was created and extended to its actor.
    OfferCreated {
        /// The new offer.
        offer_id: OfferId,
        /// Its shipment.
        shipment_id: ShipmentId,
        /// Its kind.
        kind: OfferKind,
        /// When the creation committed.
        occurred_at: DateTime<Utc>,
    },
    /// An offer was accepted; competing offers may have been cancelled.
    OfferAccepted {
        /// The winning offer.
        offer_id: OfferId,
        /// Its shipment.
        shipment_id: ShipmentId,
        /// Its kind.
        kind: OfferKind,
        /// Sibling offers cancelled in the same commit (tenders only).
        cancelled_siblings: Vec<OfferId>,
        /// When the acceptance committed.
        occurred_at: DateTime<Utc>,
    },
    /// An offer was rejected by its actor.
    OfferRejected {
        /// The rejected offer.
        offer_id: OfferId,
        /// Its shipment.
        shipment_id: ShipmentId,
        /// Its kind.
        kind: OfferKind,
        /// When the rejection committed.
        occurred_at: DateTime<Utc>,
    },
    /// An offer's response window elapsed (observed lazily or by the
    /// optional sweeper).
    OfferExpired {
        /// The expired offer.
        offer_id: OfferId,
        /// Its shipment.
        shipment_id: ShipmentId,
        /// When the expiry was observed.
        occurred_at: DateTime<Utc>,
    },
    /// An inbound response could not be applied and was queued for
    /// manual review.
    InboundUnmatched {
        /// The inbound source address.
        from: String,
        /// Why the message could not be applied.
        reason: String,
        /// When the message was received.
        occurred_at: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// The canonical event type name, for logs and audit metadata.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OfferCreated { .. } => "OFFER_CREATED",
            Self::OfferAccepted { .. } => "OFFER_ACCEPTED",
            Self::OfferRejected { .. } => "OFFER_REJECTED",
            Self::OfferExpired { .. } => "OFFER_EXPIRED",
            Self::InboundUnmatched { .. } => "INBOUND_UNMATCHED",
        }
    }

    /// The offer this event concerns, if any.
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            Self::OfferCreated { offer_id, .. }
            | Self::OfferAccepted { offer_id, .. }
            | Self::OfferRejected { offer_id, .. }
            | Self::OfferExpired { offer_id, .. } => Some(*offer_id),
            Self::InboundUnmatched { .. } => None,
        }
    }
}
