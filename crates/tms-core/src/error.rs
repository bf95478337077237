//! # Validation Errors
//!
//! Structured error types for domain-primitive construction, built with
//! `thiserror`. Each variant carries the offending input so operators can
//! see what was rejected without re-running the request.

use thiserror::Error;

/// Errors from domain-primitive validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Contact number failed format validation.
    #[error("invalid contact number {input:?}: {reason}")]
    InvalidContactNumber {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Monetary amount failed validation.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Offer expiry window outside the permitted range.
    #[error("expiry window of {hours}h is outside the permitted range of {min}h to {max}h")]
    ExpiryOutOfRange {
        /// The requested window in hours.
        hours: i64,
        /// Minimum permitted hours.
        min: i64,
        /// Maximum permitted hours.
        max: i64,
    },
}
