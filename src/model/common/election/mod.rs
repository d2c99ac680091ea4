use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Voter IDs are externally assigned student ID strings.
pub type VoterId = String;
/// Position titles, e.g. "Governor".
pub type PositionTitle = String;
/// Candidate names are unique within a position.
pub type CandidateName = String;

/// Identifies a candidate: the position they stand for plus their name.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateKey {
    pub position: PositionTitle,
    #[serde(rename = "candidate")]
    pub name: CandidateName,
}

impl CandidateKey {
    pub fn new(position: impl Into<PositionTitle>, name: impl Into<CandidateName>) -> Self {
        Self {
            position: position.into(),
            name: name.into(),
        }
    }
}

impl Display for CandidateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.position, self.name)
    }
}
