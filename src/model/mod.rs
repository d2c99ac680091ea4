//! Data types, split by where they are serialised.
//!
//! - [`common`] types appear in both the database and the API.
//! - [`db`] types are stored.
//! - [`api`] types are sent and received over HTTP.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
