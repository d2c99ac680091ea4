use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed set of department buckets that vote counts are segmented by.
/// Declaration order is the canonical order.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(usize)]
pub enum Department {
    /// College of Engineering.
    #[serde(rename = "COE")]
    Coe,
    /// College of Business Administration.
    #[serde(rename = "CBA")]
    Cba,
    /// College of Information and Computing Sciences.
    #[serde(rename = "CICS")]
    Cics,
    /// College of Industrial Technology.
    #[serde(rename = "CIT")]
    Cit,
    /// College of Education.
    #[serde(rename = "COED")]
    Coed,
}

/// Number of department buckets.
pub const DEPARTMENT_COUNT: usize = 5;

impl Department {
    /// Every department, in the canonical order used for all tally output.
    pub const ALL: [Department; DEPARTMENT_COUNT] = [
        Department::Coe,
        Department::Cba,
        Department::Cics,
        Department::Cit,
        Department::Coed,
    ];

    /// Short lowercase code, used in URLs and as the storage field name.
    pub fn code(self) -> &'static str {
        match self {
            Department::Coe => "coe",
            Department::Cba => "cba",
            Department::Cics => "cics",
            Department::Cit => "cit",
            Department::Coed => "coed",
        }
    }

    /// Position of this department in [`Department::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a participant's program string to its department bucket.
    ///
    /// Matching is exact against a fixed table after lowercasing;
    /// anything not in the table is an error rather than a guess.
    pub fn classify(affiliation: &str) -> Result<Self, ClassificationError> {
        let program = affiliation.to_lowercase();
        let department = match program.as_str() {
            "bachelor of science in computer engineering"
            | "bachelor of science in industrial engineering" => Department::Coe,
            "bachelor of science in business administration major in financial management"
            | "bachelor of science in business administration major in marketing management"
            | "bachelor of science in entrepreneurship" => Department::Cba,
            "bachelor of science in information technology" => Department::Cics,
            "bachelor of industrial technology major in automotive"
            | "bachelor of industrial technology major in drafting and digital graphics"
            | "bachelor of industrial technology major in computer"
            | "bachelor of industrial technology major in electronics"
            | "bachelor of industrial technology major in electrical"
            | "bachelor of industrial technology major in food processing" => Department::Cit,
            "bachelor of secondary education major in science"
            | "bachelor of secondary education major in mathematics"
            | "bachelor of secondary education major in social studies"
            | "bachelor of secondary education major in english minor in mandarin"
            | "bachelor of elementary education"
            | "bachelor of early childhood education"
            | "bachelor of physical education"
            | "bachelor of technical vocational teacher education"
            | "bachelor of technology and livelihood education major in home economics" => {
                Department::Coed
            }
            _ => return Err(ClassificationError(affiliation.to_string())),
        };
        Ok(department)
    }
}

impl Display for Department {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code().to_uppercase())
    }
}

/// The affiliation string did not match any known program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized affiliation: {0:?}")]
pub struct ClassificationError(pub String);

/// Parse a department from its short code (case-insensitive).
impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown department code {s:?}"))
    }
}

impl<'a> FromParam<'a> for Department {
    type Error = String;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}
