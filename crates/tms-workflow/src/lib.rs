//! # tms-workflow — Offer/Response Workflow Domain
//!
//! Pure domain logic for handing a shipment to an external actor as an
//! **offer** (a load tender to a carrier, or a dispatch assignment to a
//! driver) and resolving that actor's response into a consistent state
//! change.
//!
//! ## Modules
//!
//! - [`offer`] — the offer entity and its state machine. The only
//!   non-terminal state is OFFERED; every transition is validated and
//!   recorded in an append-only audit trail.
//! - [`shipment`] — the shipment status progression the workflow reads
//!   and conditionally writes. The workflow never invents shipment
//!   states; it only moves shipments along the fixed progression.
//! - [`eligibility`] — pre-creation checks that the target carrier or
//!   driver currently qualifies to receive an offer.
//! - [`inbound`] — classification of free-text responses arriving over
//!   unreliable channels (SMS webhooks) into accept/reject intents.
//! - [`cascade`] — single-winner resolution: which sibling offers are
//!   cancelled when one offer on a shipment is accepted.
//! - [`events`] — domain events emitted after a committed workflow
//!   operation, consumed by the notification dispatcher.
//! - [`error`] — the workflow error taxonomy.
//!
//! ## Design
//!
//! Everything in this crate is synchronous and storage-free. The API
//! layer owns stores, transactions, and delivery; this crate owns the
//! rules. That split keeps every invariant testable without a runtime.

pub mod cascade;
pub mod error;
pub mod eligibility;
pub mod events;
pub mod inbound;
pub mod offer;
pub mod shipment;

pub use cascade::{cancel_competing, cascade_on_accept};
pub use eligibility::{check_carrier, check_driver, Carrier, CarrierStatus, Driver, DriverStatus, Eligibility};
pub use error::WorkflowError;
pub use events::WorkflowEvent;
pub use inbound::{classify_intent, InboundMessage, ResponseIntent};
pub use offer::{AuditAction, AuditEntry, Offer, OfferDetails, OfferKind, OfferState};
pub use shipment::ShipmentStatus;
