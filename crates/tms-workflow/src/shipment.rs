//! # Shipment Status Progression
//!
//! The shipment is an external aggregate the workflow references but does
//! not own. Its status moves along a fixed progression:
//!
//! ```text
//! QUOTED ──▶ TENDERED ──▶ BOOKED ──▶ DISPATCHED ──▶ CONFIRMED ──▶ IN_TRANSIT ──▶ DELIVERED
//!                                                                      (CANCELLED from any)
//! ```
//!
//! The workflow writes exactly four of these as offer side effects:
//! TENDERED (first tender created), BOOKED (tender accepted), DISPATCHED
//! (dispatch offer created), CONFIRMED (dispatch accepted) — plus the
//! revert to TENDERED when a dispatch is rejected. IN_TRANSIT, DELIVERED,
//! and CANCELLED are written by tracking and billing components; the
//! workflow only ever reads them.

use serde::{Deserialize, Serialize};

/// The status of a shipment within the brokerage lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Rated and quoted; awaiting tendering.
    Quoted,
    /// At least one tender extended to a carrier.
    Tendered,
    /// A carrier accepted a tender.
    Booked,
    /// A dispatch assignment extended to a driver.
    Dispatched,
    /// A driver confirmed the dispatch assignment.
    Confirmed,
    /// Cargo is moving. Written by tracking, never by the workflow.
    InTransit,
    /// Cargo delivered. Terminal; written by tracking, never by the workflow.
    Delivered,
    /// Shipment cancelled. Terminal.
    Cancelled,
}

impl ShipmentStatus {
    /// The canonical status name (e.g., "IN_TRANSIT").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quoted => "QUOTED",
            Self::Tendered => "TENDERED",
            Self::Booked => "BOOKED",
            Self::Dispatched => "DISPATCHED",
            Self::Confirmed => "CONFIRMED",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether this status is terminal for the shipment itself.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether a tender offer may be created while the shipment is in
    /// this status. Tendering is open from QUOTED, and stays open while
    /// TENDERED so multiple carriers can hold concurrent tenders.
    pub fn allows_tender(&self) -> bool {
        matches!(self, Self::Quoted | Self::Tendered)
    }

    /// Whether a dispatch offer may be created while the shipment is in
    /// this status. Dispatch opens once the shipment is BOOKED, re-opens
    /// from TENDERED after a dispatch rejection reverts the shipment,
    /// and stays open while DISPATCHED so backup drivers can hold
    /// concurrent offers.
    pub fn allows_dispatch(&self) -> bool {
        matches!(self, Self::Booked | Self::Tendered | Self::Dispatched)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_screaming_snake() {
        assert_eq!(ShipmentStatus::Quoted.name(), "QUOTED");
        assert_eq!(ShipmentStatus::InTransit.name(), "IN_TRANSIT");
        assert_eq!(ShipmentStatus::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn test_serde_matches_names() {
        let json = serde_json::to_string(&ShipmentStatus::InTransit).unwrap();
        assert_eq!(json, "\"IN_TRANSIT\"");
        let parsed: ShipmentStatus = serde_json::from_str("\"BOOKED\"").unwrap();
        assert_eq!(parsed, ShipmentStatus::Booked);
    }

    #[test]
    fn test_tender_gate() {
        assert!(ShipmentStatus::Quoted.allows_tender());
        assert!(ShipmentStatus::Tendered.allows_tender());
        assert!(!ShipmentStatus::Booked.allows_tender());
        assert!(!ShipmentStatus::Delivered.allows_tender());
    }

    #[test]
    fn test_dispatch_gate() {
        assert!(ShipmentStatus::Booked.allows_dispatch());
        assert!(ShipmentStatus::Tendered.allows_dispatch());
        assert!(ShipmentStatus::Dispatched.allows_dispatch());
        assert!(!ShipmentStatus::Quoted.allows_dispatch());
        assert!(!ShipmentStatus::Confirmed.allows_dispatch());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Cancelled.is_terminal());
        assert!(!ShipmentStatus::Confirmed.is_terminal());
    }
}
