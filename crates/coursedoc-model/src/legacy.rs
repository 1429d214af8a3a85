//! Legacy class records, the read-only input of the import routine
//!
//! These records come from another system's collection and are never written
//! back. Session counts appear as numbers or numeric strings depending on the
//! record's age.

use serde::Deserialize;

/// Group name used when a legacy record carries no usable name
pub const UNNAMED_GROUP: &str = "Unnamed Course";

/// A class record from the legacy collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyClassRecord {
    /// Record identifier, filled by the store
    #[serde(default)]
    pub id: String,
    /// Timeslot/class name
    #[serde(default)]
    pub name: Option<String>,
    /// Group name shared by timeslots of the same course
    #[serde(default, rename = "classGroupName")]
    pub class_group_name: Option<String>,
    /// Number of sessions, as stored (number or numeric string)
    #[serde(default, rename = "numberOfSessions")]
    pub number_of_sessions: Option<SessionCount>,
}

impl LegacyClassRecord {
    /// Group key: the shared group name, else the record name, else a fixed
    /// placeholder
    #[must_use]
    pub fn group_name(&self) -> &str {
        self.class_group_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(UNNAMED_GROUP)
    }

    /// Session count if it parses as a positive integer
    #[must_use]
    pub fn sessions(&self) -> Option<i64> {
        self.number_of_sessions
            .as_ref()
            .and_then(SessionCount::value)
            .filter(|n| *n > 0)
    }
}

/// Session count as stored in the legacy collection
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SessionCount {
    /// Stored as a number
    Int(i64),
    /// Stored as a string
    Str(String),
}

impl SessionCount {
    fn value(&self) -> Option<i64> {
        match self {
            SessionCount::Int(n) => Some(*n),
            SessionCount::Str(s) => s.trim().parse().ok(),
        }
    }
}
