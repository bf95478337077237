//! # Workflow Error Taxonomy
//!
//! Structured errors for every way a workflow operation can fail, built
//! with `thiserror`. Each variant carries the context an operator needs:
//! what was missing, which transition was attempted, when an offer
//! expired. The API layer maps these onto HTTP status codes; nothing in
//! this crate knows about HTTP.

use chrono::{DateTime, Utc};
use thiserror::Error;

use tms_core::OfferId;

use crate::offer::{OfferKind, OfferState};
use crate::shipment::ShipmentStatus;

/// Errors raised by workflow operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// A referenced shipment, actor, or offer does not exist (or is not
    /// visible to the calling tenant — existence is never leaked across
    /// tenants).
    #[error("{resource} {id} not found")]
    NotFound {
        /// The kind of resource ("shipment", "carrier", "driver", "offer").
        resource: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// An active offer already exists for the same shipment and actor
    /// under the per-kind uniqueness rule.
    #[error("an active {kind} offer already exists for actor {actor} on shipment {shipment}")]
    DuplicateOffer {
        /// The offer kind whose uniqueness rule was violated.
        kind: OfferKind,
        /// The target actor.
        actor: String,
        /// The shipment.
        shipment: String,
    },

    /// The target actor failed the eligibility gate.
    #[error("actor {actor} is not eligible: {reason}")]
    Ineligible {
        /// The target actor.
        actor: String,
        /// The first failing eligibility rule.
        reason: String,
    },

    /// The shipment is not in a state that permits this offer kind.
    #[error("shipment is {status}, but {kind} offers require {requirement}")]
    WrongShipmentState {
        /// The shipment's current status.
        status: ShipmentStatus,
        /// The offer kind being created.
        kind: OfferKind,
        /// Human-readable statement of the required states.
        requirement: &'static str,
    },

    /// The requested state change is not reachable from the offer's
    /// current state.
    #[error("offer {offer_id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        /// The offer.
        offer_id: OfferId,
        /// Current state.
        from: OfferState,
        /// Attempted target state.
        to: OfferState,
    },

    /// The offer's response window elapsed before it was accepted. The
    /// offer has been moved to EXPIRED as a side effect of observing this.
    #[error("offer {offer_id} expired at {expired_at}")]
    Expired {
        /// The offer.
        offer_id: OfferId,
        /// When the response window elapsed.
        expired_at: DateTime<Utc>,
    },

    /// An inbound response could not be correlated to exactly one
    /// outstanding offer.
    #[error("inbound response from {contact} matched {candidates} outstanding offers")]
    Ambiguous {
        /// The inbound source address.
        contact: String,
        /// How many OFFERED candidates matched (zero or more than one).
        candidates: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = WorkflowError::NotFound {
            resource: "shipment",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "shipment abc not found");

        let err = WorkflowError::Ineligible {
            actor: "driver d1".to_string(),
            reason: "license expired".to_string(),
        };
        assert!(err.to_string().contains("license expired"));
    }
}
