use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{
    department::Department,
    election::{CandidateName, PositionTitle, VoterId},
};

/// A ballot that a voter wishes to cast: at most one selection per position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotSpec {
    pub voter_id: VoterId,
    /// The voter's program; decides which department bucket the votes land in.
    pub affiliation: String,
    pub selections: BTreeMap<PositionTitle, CandidateName>,
}

/// Acknowledgement that a ballot was admitted and counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub voter_id: VoterId,
    pub department: Department,
    pub selections: BTreeMap<PositionTitle, CandidateName>,
    pub cast_at: DateTime<Utc>,
}
