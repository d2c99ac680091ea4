use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{common::election::VoterId, db::voter::Voter},
};

/// A kiosk registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRegistration {
    pub student_id: VoterId,
    pub student_name: String,
    pub program: String,
}

impl TryFrom<VoterRegistration> for Voter {
    type Error = Error;

    /// Every field must be non-blank. Surrounding whitespace is dropped.
    fn try_from(registration: VoterRegistration) -> Result<Self, Self::Error> {
        let fields = [
            ("student_id", &registration.student_id),
            ("student_name", &registration.student_name),
            ("program", &registration.program),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(Error::BadRequest(format!("{field} must not be blank")));
        }
        Ok(Voter::new(
            registration.student_id.trim().to_string(),
            registration.student_name.trim().to_string(),
            registration.program.trim().to_string(),
        ))
    }
}

/// A voter as presented to the kiosk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDesc {
    pub student_id: VoterId,
    pub student_name: String,
    pub program: String,
    pub has_voted: bool,
}

impl From<Voter> for VoterDesc {
    fn from(voter: Voter) -> Self {
        Self {
            student_id: voter.id,
            student_name: voter.name,
            program: voter.affiliation,
            has_voted: voter.has_voted,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl VoterRegistration {
        pub fn example() -> Self {
            let voter = Voter::example();
            Self {
                student_id: voter.id,
                student_name: voter.name,
                program: voter.affiliation,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_trimmed() {
        let mut registration = VoterRegistration::example();
        registration.student_id = format!("  {} ", registration.student_id);
        let voter = Voter::try_from(registration).unwrap();
        assert_eq!(voter, Voter::example());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut registration = VoterRegistration::example();
        registration.student_name = "   ".to_string();
        let err = Voter::try_from(registration).unwrap_err();
        assert!(matches!(err, Error::BadRequest(msg) if msg.contains("student_name")));
    }
}
