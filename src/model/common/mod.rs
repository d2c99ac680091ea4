//! Types shared between the database and API representations.

pub mod department;
pub mod election;
