use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    options::{FindOptions, ReplaceOptions, UpdateOptions},
    Database,
};
use rocket::futures::TryStreamExt;
use serde::Serialize;

use crate::model::{
    common::{department::Department, election::CandidateKey},
    db::{
        admin::Admin, candidate::Candidate, tally::CandidateTally, voter::Voter,
        window::ElectionWindow,
    },
    mongodb::{is_duplicate_key_error, Coll, MongoCollection},
};

use super::{ElectionStore, StoreResult};

/// The election window is a single document with a fixed ID.
const WINDOW_ID: i32 = 1;

/// MongoDB-backed store.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn window_filter() -> Document {
        doc! { "_id": WINDOW_ID }
    }

    fn candidate_filter(key: &CandidateKey) -> Document {
        doc! { "position": key.position.as_str(), "name": key.name.as_str() }
    }

    fn tally_filter(key: &CandidateKey) -> Document {
        doc! { "position": key.position.as_str(), "candidate": key.name.as_str() }
    }

    /// Insert a document, mapping a duplicate key error to `false`.
    async fn insert_unique<T>(coll: Coll<T>, item: &T) -> StoreResult<bool>
    where
        T: MongoCollection + Serialize + Send + Sync,
    {
        match coll.insert_one(item, None).await {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key_error(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[rocket::async_trait]
impl ElectionStore for MongoStore {
    async fn window(&self) -> StoreResult<Option<ElectionWindow>> {
        let window = Coll::<ElectionWindow>::from_db(&self.db)
            .find_one(Self::window_filter(), None)
            .await?;
        Ok(window)
    }

    async fn put_window(&self, window: &ElectionWindow) -> StoreResult<()> {
        let upsert = ReplaceOptions::builder().upsert(true).build();
        Coll::<ElectionWindow>::from_db(&self.db)
            .replace_one(Self::window_filter(), window, upsert)
            .await?;
        Ok(())
    }

    async fn deactivate_window(&self, end: DateTime<Utc>) -> StoreResult<bool> {
        let filter = doc! {
            "_id": WINDOW_ID,
            "end": BsonDateTime::from_chrono(end),
            "active": true,
        };
        let update = doc! { "$set": { "active": false } };
        let result = Coll::<ElectionWindow>::from_db(&self.db)
            .update_one(filter, update, None)
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn voter(&self, id: &str) -> StoreResult<Option<Voter>> {
        let voter = Coll::<Voter>::from_db(&self.db)
            .find_one(doc! { "_id": id }, None)
            .await?;
        Ok(voter)
    }

    async fn insert_voter(&self, voter: &Voter) -> StoreResult<bool> {
        Self::insert_unique(Coll::from_db(&self.db), voter).await
    }

    async fn claim_voter(&self, id: &str) -> StoreResult<bool> {
        // The filter on `has_voted` makes this a single-document compare-and-set.
        let filter = doc! { "_id": id, "has_voted": false };
        let update = doc! { "$set": { "has_voted": true } };
        let result = Coll::<Voter>::from_db(&self.db)
            .update_one(filter, update, None)
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn candidate(&self, key: &CandidateKey) -> StoreResult<Option<Candidate>> {
        let candidate = Coll::<Candidate>::from_db(&self.db)
            .find_one(Self::candidate_filter(key), None)
            .await?;
        Ok(candidate)
    }

    async fn candidates(&self) -> StoreResult<Vec<Candidate>> {
        let sorted = FindOptions::builder()
            .sort(doc! { "position": 1, "name": 1 })
            .build();
        let candidates: Vec<Candidate> = Coll::<Candidate>::from_db(&self.db)
            .find(None, sorted)
            .await?
            .try_collect()
            .await?;
        Ok(candidates)
    }

    async fn insert_candidate(&self, candidate: &Candidate) -> StoreResult<bool> {
        Self::insert_unique(Coll::from_db(&self.db), candidate).await
    }

    async fn increment_tally(
        &self,
        key: &CandidateKey,
        department: Department,
    ) -> StoreResult<()> {
        let mut counter = Document::new();
        counter.insert(format!("counts.{}", department.code()), 1_i64);
        let update = doc! { "$inc": counter };
        let upsert = UpdateOptions::builder().upsert(true).build();
        let tallies = Coll::<CandidateTally>::from_db(&self.db);

        // Two concurrent first votes for the same candidate can both attempt the
        // insert; the loser hits the unique index and must retry as an update.
        let result = tallies
            .update_one(Self::tally_filter(key), update.clone(), upsert.clone())
            .await;
        match result {
            Err(e) if is_duplicate_key_error(&e) => {
                trace!("Retrying tally upsert for {key} after duplicate key");
                tallies
                    .update_one(Self::tally_filter(key), update, upsert)
                    .await?;
            }
            other => {
                other?;
            }
        }
        Ok(())
    }

    async fn tally(&self, key: &CandidateKey) -> StoreResult<Option<CandidateTally>> {
        let tally = Coll::<CandidateTally>::from_db(&self.db)
            .find_one(Self::tally_filter(key), None)
            .await?;
        Ok(tally)
    }

    async fn tallies(&self) -> StoreResult<Vec<CandidateTally>> {
        let tallies: Vec<CandidateTally> = Coll::<CandidateTally>::from_db(&self.db)
            .find(None, None)
            .await?
            .try_collect()
            .await?;
        Ok(tallies)
    }

    async fn admin(&self, username: &str) -> StoreResult<Option<Admin>> {
        let admin = Coll::<Admin>::from_db(&self.db)
            .find_one(doc! { "username": username }, None)
            .await?;
        Ok(admin)
    }

    async fn insert_admin(&self, admin: &Admin) -> StoreResult<bool> {
        Self::insert_unique(Coll::from_db(&self.db), admin).await
    }

    async fn admin_count(&self) -> StoreResult<u64> {
        let count = Coll::<Admin>::from_db(&self.db)
            .count_documents(None, None)
            .await?;
        Ok(count)
    }
}
