use serde::{Deserialize, Serialize};

use crate::model::common::election::{CandidateKey, CandidateName, PositionTitle};

/// A candidate standing for a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub position: PositionTitle,
    pub name: CandidateName,
    #[serde(default)]
    pub year_level: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub partylist: String,
    #[serde(default)]
    pub credentials: Vec<String>,
}

impl Candidate {
    pub fn key(&self) -> CandidateKey {
        CandidateKey::new(self.position.clone(), self.name.clone())
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Candidate {
        pub fn example(position: &str, name: &str) -> Self {
            Self {
                position: position.to_string(),
                name: name.to_string(),
                year_level: "3rd Year".to_string(),
                program: "Bachelor of Science in Information Technology".to_string(),
                partylist: "Kaagapay".to_string(),
                credentials: vec!["Class President".to_string()],
            }
        }

        /// One candidate per position on the standard three-position ballot.
        pub fn slate() -> Vec<Self> {
            vec![
                Self::example("Governor", "Alice"),
                Self::example("Governor", "Bob"),
                Self::example("Vice Governor", "Carol"),
                Self::example("Vice Governor", "Dave"),
                Self::example("Board Member", "Eve"),
            ]
        }
    }
}
