use serde::{Deserialize, Serialize};

use crate::model::common::election::VoterId;

/// A registered voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    /// Externally assigned student ID.
    #[serde(rename = "_id")]
    pub id: VoterId,
    pub name: String,
    /// The voter's program, from which their department is derived.
    pub affiliation: String,
    /// Set exactly once, when the voter's ballot is admitted.
    #[serde(default)]
    pub has_voted: bool,
}

impl Voter {
    /// A freshly registered voter who has not yet voted.
    pub fn new(id: VoterId, name: String, affiliation: String) -> Self {
        Self {
            id,
            name,
            affiliation,
            has_voted: false,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Voter {
        pub fn example() -> Self {
            Self::new(
                "2021-00042".to_string(),
                "Juan dela Cruz".to_string(),
                "Bachelor of Science in Information Technology".to_string(),
            )
        }

        pub fn example2() -> Self {
            Self::new(
                "2020-01337".to_string(),
                "Maria Clara".to_string(),
                "Bachelor of Elementary Education".to_string(),
            )
        }
    }
}
