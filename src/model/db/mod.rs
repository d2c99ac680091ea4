//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - Datetimes are serialised in MongoDB's own format.
//! - Counters missing from a stored document deserialise as zero.

pub mod admin;
pub mod candidate;
pub mod tally;
pub mod voter;
pub mod window;
