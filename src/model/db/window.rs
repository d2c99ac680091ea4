use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// The singleton voting window.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionWindow {
    /// Voting opens.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start: DateTime<Utc>,
    /// Voting closes; exclusive.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end: DateTime<Utc>,
    /// Whether votes are currently accepted.
    pub active: bool,
}

impl ElectionWindow {
    /// Create a window, deciding `active` against `now` from the requested times.
    ///
    /// The stored times are truncated to whole seconds so that the value
    /// round-trips through every store unchanged.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            start: start.trunc_subsecs(0),
            end: end.trunc_subsecs(0),
            active: start <= now && now < end,
        }
    }

    /// Does the half-open interval `[start, end)` contain `time`?
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }

    /// Are votes accepted at `time`?
    /// The flag alone is not trusted past `end`, in case deactivation is late.
    pub fn is_open(&self, time: DateTime<Utc>) -> bool {
        self.active && self.contains(time)
    }
}
