#![deny(missing_docs)]

//! # tms-core — Foundational Types for the TMS Stack
//!
//! This crate defines the foundational types that every other crate in the
//! workspace depends on. It has no internal crate dependencies — only
//! `serde`, `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`CarrierId`] where a [`DriverId`]
//!    is expected, and a raw `Uuid` never crosses a workflow boundary.
//!
//! 2. **Validate at construction.** String-backed primitives
//!    ([`ContactNumber`]) and bounded values ([`ExpiryWindow`]) reject
//!    invalid input when built, so downstream code never re-checks them.
//!
//! 3. **No floats for money.** [`Money`] is integer minor units. A float
//!    amount cannot be represented, which keeps persisted and serialized
//!    amounts exact.
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with
//!    `thiserror` — no `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use identity::{CarrierId, ContactNumber, DriverId, OfferId, ShipmentId, TenantId};
pub use money::Money;
pub use temporal::ExpiryWindow;
