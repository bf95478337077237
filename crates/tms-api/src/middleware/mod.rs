//! # HTTP Middleware
//!
//! - [`metrics`] — in-process request/error counters.
//! - [`rate_limit`] — token-bucket limiting for the unauthenticated
//!   webhook surface, keyed by client address.

pub mod metrics;
pub mod rate_limit;
