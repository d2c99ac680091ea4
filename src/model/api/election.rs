use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::window::ElectionWindow;

/// A request to set the voting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Whether voting is currently open, plus the configured window if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionStatus {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end: Option<DateTime<Utc>>,
}

impl ElectionStatus {
    /// Status when no window has ever been set.
    pub fn unconfigured() -> Self {
        Self {
            active: false,
            start: None,
            end: None,
        }
    }

    /// Status of the given window as seen at `now`.
    pub fn of(window: &ElectionWindow, now: DateTime<Utc>) -> Self {
        Self {
            active: window.is_open(now),
            start: Some(window.start),
            end: Some(window.end),
        }
    }
}
