use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    model::{
        api::tally::{CandidateTallyDesc, PositionTally},
        common::election::{CandidateKey, CandidateName, PositionTitle},
        db::tally::DepartmentCounts,
    },
    store::SharedStore,
};

/// Reshapes flat counters into the nested position -> candidate -> department view.
#[derive(Clone)]
pub struct TallyReconstructor {
    store: SharedStore,
}

impl TallyReconstructor {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The full tally. Positions are sorted by title and candidates by name.
    ///
    /// Registered candidates without votes appear with zeros. Counters whose
    /// candidate record has gone missing are still reported.
    pub async fn tally(&self) -> Result<Vec<PositionTally>> {
        let candidates = self
            .store
            .candidates()
            .await
            .map_err(Error::persistence("load candidates"))?;
        let tallies = self
            .store
            .tallies()
            .await
            .map_err(Error::persistence("load tallies"))?;

        let mut positions: BTreeMap<PositionTitle, BTreeMap<CandidateName, DepartmentCounts>> =
            BTreeMap::new();
        for candidate in candidates {
            positions
                .entry(candidate.position)
                .or_default()
                .entry(candidate.name)
                .or_default();
        }
        for tally in tallies {
            positions
                .entry(tally.key.position)
                .or_default()
                .insert(tally.key.name, tally.counts);
        }

        Ok(positions
            .into_iter()
            .map(|(title, candidates)| PositionTally {
                title,
                candidates: candidates
                    .into_iter()
                    .map(|(name, counts)| CandidateTallyDesc::new(name, &counts))
                    .collect(),
            })
            .collect())
    }

    /// One candidate's live counts. Zero if registered but not yet voted for.
    pub async fn candidate_tally(&self, key: &CandidateKey) -> Result<CandidateTallyDesc> {
        let tally = self
            .store
            .tally(key)
            .await
            .map_err(Error::persistence("load tally"))?;
        if let Some(tally) = tally {
            return Ok(CandidateTallyDesc::new(tally.key.name, &tally.counts));
        }

        let candidate = self
            .store
            .candidate(key)
            .await
            .map_err(Error::persistence("load candidate"))?;
        match candidate {
            Some(candidate) => Ok(CandidateTallyDesc::new(
                candidate.name,
                &DepartmentCounts::default(),
            )),
            None => Err(Error::not_found(format!("candidate {key}"))),
        }
    }
}
