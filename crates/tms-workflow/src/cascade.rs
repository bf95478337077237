//! # Cascading Resolution
//!
//! When an offer is accepted, competing offers on the same shipment may
//! need to be resolved. Whether they are is a **per-kind policy**, not a
//! universal rule:
//!
//! - **TENDER** — single winner. Exactly one carrier wins a shipment, so
//!   accepting one tender cancels every other OFFERED tender for that
//!   shipment.
//! - **DISPATCH** — no cascade. Concurrent dispatch offers to different
//!   drivers are primary/backup/emergency assignments and deliberately
//!   stay live when one driver confirms.
//!
//! Cancellation happens inside the same atomic update as the winning
//! transition; each cancelled offer records why it was withdrawn.

use chrono::{DateTime, Utc};

use tms_core::OfferId;

use crate::offer::{Offer, OfferKind, OfferState, SYSTEM_ACTOR};

/// Whether accepting an offer of this kind cancels competing OFFERED
/// siblings.
pub fn cascade_on_accept(kind: OfferKind) -> bool {
    match kind {
        OfferKind::Tender => true,
        OfferKind::Dispatch => false,
    }
}

/// Cancel the competitors of a just-accepted offer.
///
/// `offers` is the full offer set of one shipment, containing the winner
/// (already ACCEPTED). Siblings are cancelled only when the winning kind
/// cascades, and only siblings of the *same kind* still in OFFERED are
/// touched. Returns the cancelled offer ids, in offer order.
pub fn cancel_competing(
    offers: &mut [Offer],
    winning_id: OfferId,
    now: DateTime<Utc>,
) -> Vec<OfferId> {
    let Some(winner_kind) = offers
        .iter()
        .find(|o| o.id == winning_id)
        .map(Offer::kind)
    else {
        return Vec::new();
    };

    if !cascade_on_accept(winner_kind) {
        return Vec::new();
    }

    let note = format!("superseded by accepted offer {winning_id}");
    let mut cancelled = Vec::new();
    for offer in offers.iter_mut() {
        if offer.id == winning_id || offer.kind() != winner_kind {
            continue;
        }
        if offer.state != OfferState::Offered {
            continue;
        }
        // OFFERED -> CANCELLED always validates for a sibling that passed
        // the state filter above.
        if offer
            .try_transition(OfferState::Cancelled, SYSTEM_ACTOR, Some(note.clone()), now)
            .is_ok()
        {
            cancelled.push(offer.id);
        }
    }
    cancelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use tms_core::{CarrierId, DriverId, ExpiryWindow, Money, ShipmentId, TenantId};
    use crate::offer::AuditAction;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn tender(shipment: ShipmentId, tenant: TenantId) -> Offer {
        Offer::new_tender(
            shipment,
            tenant,
            CarrierId::new(),
            Money::from_cents(240_000).unwrap(),
            ExpiryWindow::default(),
            now(),
        )
    }

    fn dispatch(shipment: ShipmentId, tenant: TenantId) -> Offer {
        Offer::new_dispatch(shipment, tenant, DriverId::new(), "load 77".to_string(), now())
    }

    #[test]
    fn test_policy_flags() {
        assert!(cascade_on_accept(OfferKind::Tender));
        assert!(!cascade_on_accept(OfferKind::Dispatch));
    }

    #[test]
    fn test_tender_accept_cancels_offered_siblings() {
        let shipment = ShipmentId::new();
        let tenant = TenantId::new();
        let mut offers = vec![
            tender(shipment, tenant),
            tender(shipment, tenant),
            tender(shipment, tenant),
        ];
        let winner = offers[1].id;
        offers[1]
            .try_transition(OfferState::Accepted, "carrier-ops", None, now())
            .unwrap();

        let cancelled = cancel_competing(&mut offers, winner, now());

        assert_eq!(cancelled, vec![offers[0].id, offers[2].id]);
        assert_eq!(offers[0].state, OfferState::Cancelled);
        assert_eq!(offers[1].state, OfferState::Accepted);
        assert_eq!(offers[2].state, OfferState::Cancelled);
    }

    #[test]
    fn test_cancelled_siblings_record_the_winner() {
        let shipment = ShipmentId::new();
        let tenant = TenantId::new();
        let mut offers = vec![tender(shipment, tenant), tender(shipment, tenant)];
        let winner = offers[0].id;
        offers[0]
            .try_transition(OfferState::Accepted, "carrier-ops", None, now())
            .unwrap();

        cancel_competing(&mut offers, winner, now());

        let entry = offers[1].audit_trail.last().unwrap();
        assert_eq!(entry.action, AuditAction::Cancelled);
        assert_eq!(entry.actor, SYSTEM_ACTOR);
        assert_eq!(
            entry.note.as_deref(),
            Some(format!("superseded by accepted offer {winner}").as_str())
        );
    }

    #[test]
    fn test_terminal_siblings_are_left_alone() {
        let shipment = ShipmentId::new();
        let tenant = TenantId::new();
        let mut offers = vec![tender(shipment, tenant), tender(shipment, tenant)];
        offers[1]
            .try_transition(OfferState::Rejected, "carrier-ops", None, now())
            .unwrap();
        let winner = offers[0].id;
        offers[0]
            .try_transition(OfferState::Accepted, "carrier-ops", None, now())
            .unwrap();

        let cancelled = cancel_competing(&mut offers, winner, now());

        assert!(cancelled.is_empty());
        assert_eq!(offers[1].state, OfferState::Rejected);
    }

    #[test]
    fn test_dispatch_accept_cancels_nothing() {
        let shipment = ShipmentId::new();
        let tenant = TenantId::new();
        let mut offers = vec![
            dispatch(shipment, tenant),
            dispatch(shipment, tenant),
            dispatch(shipment, tenant),
        ];
        let winner = offers[0].id;
        offers[0]
            .try_transition(OfferState::Accepted, "driver", None, now())
            .unwrap();

        let cancelled = cancel_competing(&mut offers, winner, now());

        assert!(cancelled.is_empty());
        // Backup dispatch offers stay live.
        assert_eq!(offers[1].state, OfferState::Offered);
        assert_eq!(offers[2].state, OfferState::Offered);
    }

    #[test]
    fn test_tender_accept_does_not_touch_dispatch_offers() {
        let shipment = ShipmentId::new();
        let tenant = TenantId::new();
        let mut offers = vec![tender(shipment, tenant), dispatch(shipment, tenant)];
        let winner = offers[0].id;
        offers[0]
            .try_transition(OfferState::Accepted, "carrier-ops", None, now())
            .unwrap();

        let cancelled = cancel_competing(&mut offers, winner, now());

        assert!(cancelled.is_empty());
        assert_eq!(offers[1].state, OfferState::Offered);
    }

    #[test]
    fn test_unknown_winner_is_a_no_op() {
        let shipment = ShipmentId::new();
        let tenant = TenantId::new();
        let mut offers = vec![tender(shipment, tenant)];
        let cancelled = cancel_competing(&mut offers, OfferId::new(), now());
        assert!(cancelled.is_empty());
        assert_eq!(offers[0].state, OfferState::Offered);
    }
}
