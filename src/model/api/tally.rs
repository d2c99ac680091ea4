use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        department::{Department, DEPARTMENT_COUNT},
        election::{CandidateName, PositionTitle},
    },
    db::tally::DepartmentCounts,
};

/// Every candidate standing for one position, with their votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTally {
    pub title: PositionTitle,
    pub candidates: Vec<CandidateTallyDesc>,
}

/// One candidate's votes, per department in [`Department::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTallyDesc {
    pub name: CandidateName,
    pub votes: [u64; DEPARTMENT_COUNT],
    pub total: u64,
}

impl CandidateTallyDesc {
    pub fn new(name: CandidateName, counts: &DepartmentCounts) -> Self {
        Self {
            name,
            votes: counts.to_vector(),
            total: counts.total(),
        }
    }
}

/// A single candidate's vote count within one department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentVotes {
    pub department: Department,
    pub votes: u64,
}
