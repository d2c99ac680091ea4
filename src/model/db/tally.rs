use serde::{Deserialize, Serialize};

use crate::model::common::{
    department::{Department, DEPARTMENT_COUNT},
    election::CandidateKey,
};

/// One vote counter per department bucket.
///
/// Field names match [`Department::code`], which is what the store's atomic
/// increment targets. Missing fields read as zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentCounts {
    #[serde(default)]
    pub coe: u64,
    #[serde(default)]
    pub cba: u64,
    #[serde(default)]
    pub cics: u64,
    #[serde(default)]
    pub cit: u64,
    #[serde(default)]
    pub coed: u64,
}

impl DepartmentCounts {
    pub fn get(&self, department: Department) -> u64 {
        match department {
            Department::Coe => self.coe,
            Department::Cba => self.cba,
            Department::Cics => self.cics,
            Department::Cit => self.cit,
            Department::Coed => self.coed,
        }
    }

    /// Add one vote to the given bucket.
    pub fn increment(&mut self, department: Department) {
        let counter = match department {
            Department::Coe => &mut self.coe,
            Department::Cba => &mut self.cba,
            Department::Cics => &mut self.cics,
            Department::Cit => &mut self.cit,
            Department::Coed => &mut self.coed,
        };
        *counter += 1;
    }

    /// Counts laid out in [`Department::ALL`] order.
    pub fn to_vector(&self) -> [u64; DEPARTMENT_COUNT] {
        Department::ALL.map(|d| self.get(d))
    }

    /// Sum over all buckets. This is the only source of a candidate's total.
    pub fn total(&self) -> u64 {
        Department::ALL.into_iter().map(|d| self.get(d)).sum()
    }
}

/// Durable per-department counters for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    #[serde(flatten)]
    pub key: CandidateKey,
    #[serde(default)]
    pub counts: DepartmentCounts,
}

impl CandidateTally {
    pub fn total(&self) -> u64 {
        self.counts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_buckets() {
        let mut counts = DepartmentCounts::default();
        assert_eq!(counts.total(), 0);

        let sequence = [
            Department::Cics,
            Department::Coe,
            Department::Cics,
            Department::Coed,
            Department::Cit,
            Department::Cba,
            Department::Coed,
        ];
        for (i, department) in sequence.into_iter().enumerate() {
            counts.increment(department);
            assert_eq!(counts.total(), i as u64 + 1);
            assert_eq!(counts.total(), counts.to_vector().iter().sum::<u64>());
        }
        assert_eq!(counts.to_vector(), [1, 1, 2, 1, 2]);
    }

    #[test]
    fn missing_counters_deserialise_as_zero() {
        let doc = mongodb::bson::doc! {
            "position": "Governor",
            "candidate": "Alice",
            "counts": { "cics": 3_i32 },
        };
        let tally: CandidateTally = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(tally.key, CandidateKey::new("Governor", "Alice"));
        assert_eq!(tally.counts.to_vector(), [0, 0, 3, 0, 0]);
        assert_eq!(tally.total(), 3);
    }
}
