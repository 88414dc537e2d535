//! Remote payload shapes.
//!
//! The intranet's JSON is loose: numbers arrive as strings, optional fields
//! are sometimes `null` and sometimes missing, and the registered-students
//! endpoint has grown fields over the years. Decoding is tolerant — only
//! the identifiers the client actually needs are required.

use serde::{Deserialize, Deserializer, Serialize};

use epicheck_roster::{EventRef, PresenceStatus, Roster, Student};

// ---------------------------------------------------------------------------
// Registered students (roster endpoint)
// ---------------------------------------------------------------------------

/// One entry of the registered-students array.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredEntry {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Display title, e.g. `"Marie CURIE"`.
    #[serde(default)]
    pub title: Option<String>,
    /// `"present"`, `"absent"`, anything else or missing means unmarked.
    #[serde(default)]
    pub present: Option<String>,
}

impl RegisteredEntry {
    pub fn into_student(self) -> Student {
        let presence = PresenceStatus::from_remote(self.present.as_deref());
        Student {
            login: self.login,
            email: self.email.filter(|e| !e.is_empty()),
            display_name: self.title.filter(|t| !t.is_empty()),
            presence,
        }
    }
}

/// Decode the whole registered array into a roster, skipping entries the
/// remote returns without a login (observed on dropped registrations).
pub fn roster_from_entries(entries: Vec<RegisteredEntry>) -> Roster {
    Roster::new(
        entries
            .into_iter()
            .filter(|e| !e.login.trim().is_empty())
            .map(RegisteredEntry::into_student)
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Planning (day's activities)
// ---------------------------------------------------------------------------

/// One planning entry as returned by the planning endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanningEntry {
    #[serde(deserialize_with = "de_loose_i32")]
    pub scolaryear: i32,
    pub codemodule: String,
    pub codeinstance: String,
    pub codeacti: String,
    pub codeevent: String,
    #[serde(default)]
    pub acti_title: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub room: Option<RoomField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomField {
    #[serde(default)]
    pub code: Option<String>,
}

/// A scheduled activity occurrence, ready for display and for opening a
/// scan session on its [`EventRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledActivity {
    pub event: EventRef,
    pub title: String,
    pub room: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl From<PlanningEntry> for ScheduledActivity {
    fn from(e: PlanningEntry) -> Self {
        ScheduledActivity {
            event: EventRef {
                year: e.scolaryear,
                module: e.codemodule,
                instance: e.codeinstance,
                activity: e.codeacti,
                occurrence: e.codeevent,
            },
            title: e.acti_title.unwrap_or_default(),
            room: e.room.and_then(|r| r.code),
            start: e.start,
            end: e.end,
        }
    }
}

/// The remote serializes the scholar year as either a number or a string.
fn de_loose_i32<'de, D>(d: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Num(i32),
        Text(String),
    }
    match Loose::deserialize(d)? {
        Loose::Num(n) => Ok(n),
        Loose::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
