use std::collections::BTreeMap;

use chrono::Utc;

use crate::{
    error::{Error, Result},
    model::{
        api::ballot::VoteReceipt,
        common::{
            department::Department,
            election::{CandidateKey, CandidateName, PositionTitle},
        },
    },
    store::SharedStore,
};

use super::aggregator::TallyAggregator;

/// Decides whether a ballot may be accepted, and if so, commits it.
#[derive(Clone)]
pub struct VotingGate {
    store: SharedStore,
    aggregator: TallyAggregator,
}

impl VotingGate {
    pub fn new(store: SharedStore) -> Self {
        Self {
            aggregator: TallyAggregator::new(store.clone()),
            store,
        }
    }

    /// Admit a ballot: check it, consume the voter, then count each selection
    /// in the voter's department.
    ///
    /// Every rejection happens before anything is written. Claiming the voter
    /// is the only point of mutual exclusion, so two ballots from the same voter
    /// can never both be counted.
    pub async fn admit_vote(
        &self,
        voter_id: &str,
        selections: &BTreeMap<PositionTitle, CandidateName>,
        affiliation: &str,
    ) -> Result<VoteReceipt> {
        let department = Department::classify(affiliation)?;
        if selections.is_empty() {
            return Err(Error::BadRequest("ballot has no selections".into()));
        }
        if let Some((position, _)) = selections
            .iter()
            .find(|(position, name)| position.trim().is_empty() || name.trim().is_empty())
        {
            return Err(Error::BadRequest(format!(
                "blank selection for position {position:?}"
            )));
        }

        let window = self
            .store
            .window()
            .await
            .map_err(Error::persistence("load election window"))?;
        if !window.map_or(false, |window| window.is_open(Utc::now())) {
            return Err(Error::ElectionClosed);
        }

        let voter = self
            .store
            .voter(voter_id)
            .await
            .map_err(Error::persistence("load voter"))?
            .ok_or_else(|| Error::VoterNotFound(voter_id.to_string()))?;
        if voter.has_voted {
            return Err(Error::AlreadyVoted(voter.id));
        }

        let keys: Vec<CandidateKey> = selections
            .iter()
            .map(|(position, name)| CandidateKey::new(position.clone(), name.clone()))
            .collect();
        for key in &keys {
            let candidate = self
                .store
                .candidate(key)
                .await
                .map_err(Error::persistence("load candidate"))?;
            if candidate.is_none() {
                return Err(Error::BadRequest(format!(
                    "{} is not a candidate for {}",
                    key.name, key.position
                )));
            }
        }

        let claimed = self
            .store
            .claim_voter(&voter.id)
            .await
            .map_err(Error::persistence("mark voter as voted"))?;
        if !claimed {
            warn!("Voter {} lost a race to a concurrent ballot", voter.id);
            return Err(Error::AlreadyVoted(voter.id));
        }

        for key in &keys {
            if let Err(e) = self.aggregator.increment(key, department).await {
                error!(
                    "Voter {} is marked as voted but their vote for {key} was not counted",
                    voter.id
                );
                return Err(e);
            }
        }

        info!(
            "Admitted ballot from voter {} ({department}, {} selections)",
            voter.id,
            keys.len()
        );
        Ok(VoteReceipt {
            voter_id: voter.id,
            department,
            selections: selections.clone(),
            cast_at: Utc::now(),
        })
    }
}
