//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the TMS stack.
//! Each identifier is a distinct type — you cannot pass a [`CarrierId`]
//! where a [`DriverId`] is expected.
//!
//! ## Validation
//!
//! The string-based [`ContactNumber`] validates and normalizes its format
//! at construction time. UUID-based identifiers ([`OfferId`],
//! [`ShipmentId`], [`CarrierId`], [`DriverId`], [`TenantId`]) are always
//! valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

macro_rules! uuid_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_newtype! {
    /// A unique identifier for an offer (load tender or dispatch assignment).
    OfferId
}

uuid_newtype! {
    /// A unique identifier for a shipment.
    ShipmentId
}

uuid_newtype! {
    /// A unique identifier for a carrier (tender recipient).
    CarrierId
}

uuid_newtype! {
    /// A unique identifier for a driver (dispatch recipient).
    DriverId
}

uuid_newtype! {
    /// A unique identifier for a tenant (brokerage operating the system).
    TenantId
}

// ---------------------------------------------------------------------------
// Contact number (validated, normalized at construction)
// ---------------------------------------------------------------------------

/// A validated, normalized contact number in E.164-style form.
///
/// Inbound webhook correlation compares the provider's `from` address
/// against drivers' registered numbers, so both sides must normalize the
/// same way: formatting characters (spaces, dashes, dots, parentheses)
/// are stripped, an optional leading `+` is preserved, and the remaining
/// digits must number between 7 and 15.
///
/// Two `ContactNumber` values compare equal iff their normalized forms
/// are identical — `"+1 (555) 010-2222"` equals `"+15550102222"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactNumber(String);

impl ContactNumber {
    /// Minimum number of digits after normalization.
    const MIN_DIGITS: usize = 7;
    /// Maximum number of digits after normalization (ITU E.164 limit).
    const MAX_DIGITS: usize = 15;

    /// Create a validated contact number, normalizing formatting.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidContactNumber`] if the input is
    /// empty, contains characters other than digits and the accepted
    /// formatting set, or has a digit count outside 7..=15.
    pub fn new(input: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() {
            return Err(ValidationError::InvalidContactNumber {
                input: raw.to_string(),
                reason: "empty",
            });
        }

        let mut normalized = String::with_capacity(raw.len());
        for (i, c) in raw.chars().enumerate() {
            match c {
                '+' if i == 0 => normalized.push('+'),
                '0'..='9' => normalized.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => {
                    return Err(ValidationError::InvalidContactNumber {
                        input: raw.to_string(),
                        reason: "unexpected character",
                    });
                }
            }
        }

        let digits = normalized.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(ValidationError::InvalidContactNumber {
                input: raw.to_string(),
                reason: "digit count outside 7..=15",
            });
        }

        Ok(Self(normalized))
    }

    /// Return the normalized number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContactNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
