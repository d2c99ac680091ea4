//! The election engine: window lifecycle, ballot admission and tallying.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            ballot::VoteReceipt,
            election::ElectionStatus,
            tally::{CandidateTallyDesc, PositionTally},
        },
        common::election::{CandidateKey, CandidateName, PositionTitle},
        db::window::ElectionWindow,
    },
    store::SharedStore,
};

mod aggregator;
mod gate;
mod reconstructor;
mod scheduler;

pub use aggregator::TallyAggregator;
pub use gate::VotingGate;
pub use reconstructor::TallyReconstructor;
pub use scheduler::ElectionScheduler;

/// Everything the API needs from the engine, behind one managed handle.
pub struct Election {
    scheduler: ElectionScheduler,
    gate: VotingGate,
    reconstructor: TallyReconstructor,
}

impl Election {
    pub fn new(store: SharedStore) -> Self {
        Self {
            scheduler: ElectionScheduler::new(store.clone()),
            gate: VotingGate::new(store.clone()),
            reconstructor: TallyReconstructor::new(store),
        }
    }

    pub async fn set_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ElectionWindow> {
        self.scheduler.set_window(start, end).await
    }

    /// Is voting open right now? An unconfigured election is simply closed.
    pub async fn status(&self) -> Result<ElectionStatus> {
        match self.scheduler.current_window().await {
            Ok(window) => Ok(ElectionStatus::of(&window, Utc::now())),
            Err(Error::NotConfigured) => Ok(ElectionStatus::unconfigured()),
            Err(e) => Err(e),
        }
    }

    pub async fn cast_vote(
        &self,
        voter_id: &str,
        selections: &BTreeMap<PositionTitle, CandidateName>,
        affiliation: &str,
    ) -> Result<VoteReceipt> {
        self.gate.admit_vote(voter_id, selections, affiliation).await
    }

    pub async fn tally(&self) -> Result<Vec<PositionTally>> {
        self.reconstructor.tally().await
    }

    pub async fn candidate_tally(&self, key: &CandidateKey) -> Result<CandidateTallyDesc> {
        self.reconstructor.candidate_tally(key).await
    }

    /// Re-arm the deactivation timer from persisted state.
    pub async fn recover_schedule(&self) -> Result<()> {
        self.scheduler.recover_on_startup().await
    }
}

/// A fairing that builds the [`Election`] over the managed store, recovers its
/// deactivation timer during Rocket ignition, and places it into managed state.
/// This fairing depends on the store being available in managed state,
/// and so must be attached after the fairing responsible for that.
pub struct ElectionFairing;

#[rocket::async_trait]
impl Fairing for ElectionFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let store = match rocket.state::<SharedStore>() {
            Some(store) => store.clone(),
            None => {
                error!("Store was not available when starting the election engine");
                return Err(rocket);
            }
        };

        info!("Recovering election schedule...");
        let election = Election::new(store);
        if let Err(e) = election.recover_schedule().await {
            error!("Failed to recover election schedule: {e}");
            return Err(rocket);
        }
        info!("...election schedule recovered!");

        rocket = rocket.manage(election);
        Ok(rocket)
    }
}
