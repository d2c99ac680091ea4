//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Datetimes are serialised as RFC 3339 strings.
//! - Vote counts are serialised as vectors in canonical department order.

pub mod admin;
pub mod auth;
pub mod ballot;
pub mod election;
pub mod tally;
pub mod voter;
