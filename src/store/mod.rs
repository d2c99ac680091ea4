//! Persistence consumed by the election engine.
//!
//! The engine only needs keyed reads, an upsert for the window singleton, a
//! conditional "claim" on voters and an atomic insert-or-add on tally counters.
//! [`MongoStore`] is the production backend; [`MemoryStore`] backs development
//! runs without a database URI and the test suite.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    common::{department::Department, election::CandidateKey},
    db::{
        admin::Admin, candidate::Candidate, tally::CandidateTally, voter::Voter,
        window::ElectionWindow,
    },
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The store shared between request handlers and the deactivation timer.
pub type SharedStore = Arc<dyn ElectionStore>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    /// The election window singleton, if one has been set.
    async fn window(&self) -> StoreResult<Option<ElectionWindow>>;

    /// Create or overwrite the election window singleton.
    async fn put_window(&self, window: &ElectionWindow) -> StoreResult<()>;

    /// Mark the window inactive, but only if it is still the active window ending at `end`.
    /// Returns whether anything changed.
    async fn deactivate_window(&self, end: DateTime<Utc>) -> StoreResult<bool>;

    async fn voter(&self, id: &str) -> StoreResult<Option<Voter>>;

    /// Insert a new voter. Returns false if the ID is already registered.
    async fn insert_voter(&self, voter: &Voter) -> StoreResult<bool>;

    /// Atomically set `has_voted` only if it is currently false.
    /// Returns true iff this call performed the transition.
    async fn claim_voter(&self, id: &str) -> StoreResult<bool>;

    async fn candidate(&self, key: &CandidateKey) -> StoreResult<Option<Candidate>>;

    async fn candidates(&self) -> StoreResult<Vec<Candidate>>;

    /// Insert a new candidate. Returns false if the key is already taken.
    async fn insert_candidate(&self, candidate: &Candidate) -> StoreResult<bool>;

    /// Atomically add one to a candidate's department counter, creating the
    /// counters at zero first if this is the candidate's first vote.
    async fn increment_tally(&self, key: &CandidateKey, department: Department)
        -> StoreResult<()>;

    async fn tally(&self, key: &CandidateKey) -> StoreResult<Option<CandidateTally>>;

    /// Every counter row, in no particular order.
    async fn tallies(&self) -> StoreResult<Vec<CandidateTally>>;

    async fn admin(&self, username: &str) -> StoreResult<Option<Admin>>;

    /// Insert a new admin. Returns false if the username is already taken.
    async fn insert_admin(&self, admin: &Admin) -> StoreResult<bool>;

    async fn admin_count(&self) -> StoreResult<u64>;
}
