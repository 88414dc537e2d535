//! Core data types shared across the EpiCheck crates.
//!
//! Everything here is plain data: the roster is a point-in-time snapshot
//! fetched in full, replaced wholesale on refresh, and never treated as a
//! cache with invalidation rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PresenceStatus
// ---------------------------------------------------------------------------

/// Attendance state of one student for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Present,
    Absent,
    /// The remote has no recorded state yet (fresh roster, never marked).
    Unknown,
}

impl PresenceStatus {
    /// Wire value expected by the remote update endpoint.
    ///
    /// `Unknown` maps to the remote's "clear" value; the intranet treats the
    /// update as a plain overwrite, so re-sending any value is safe.
    pub fn as_remote_str(&self) -> &'static str {
        match self {
            PresenceStatus::Present => "present",
            PresenceStatus::Absent => "absent",
            PresenceStatus::Unknown => "",
        }
    }

    /// Parse the remote's loose presence field (missing or unrecognized
    /// values are `Unknown`, never an error).
    pub fn from_remote(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("present") => PresenceStatus::Present,
            Some(s) if s.eq_ignore_ascii_case("absent") => PresenceStatus::Absent,
            _ => PresenceStatus::Unknown,
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PresenceStatus::Present => "present",
            PresenceStatus::Absent => "absent",
            PresenceStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

/// One registered student as returned by the remote roster endpoint.
///
/// Identity key is `login`, but the remote does not guarantee it is free of
/// the `@domain` suffix, nor that it equals `email`. The login is kept
/// byte-for-byte as received because presence updates must round-trip it
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub login: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub presence: PresenceStatus,
}

impl Student {
    /// Login with any `@domain` suffix removed.
    pub fn bare_login(&self) -> &str {
        self.login.split('@').next().unwrap_or(&self.login)
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Ordered list of students registered for one event.
///
/// Logins are expected unique within a roster; the matcher explicitly
/// handles the case where they are not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// Exact-login lookup (byte equality, the identity key).
    pub fn find(&self, login: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.login == login)
    }

    pub(crate) fn find_mut(&mut self, login: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.login == login)
    }
}

// ---------------------------------------------------------------------------
// EventRef
// ---------------------------------------------------------------------------

/// Composite key identifying one scheduled activity occurrence.
///
/// Opaque to the core: supplied by the caller (planning fetch or CLI
/// argument), never constructed or interpreted here beyond display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef {
    /// Scholar year, e.g. `2025`.
    pub year: i32,
    /// Module code, e.g. `B-INN-000`.
    pub module: String,
    /// Module instance code, e.g. `PAR-0-1`.
    pub instance: String,
    /// Activity code, e.g. `acti-123456`.
    pub activity: String,
    /// Occurrence (event) code, e.g. `event-654321`.
    pub occurrence: String,
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.year, self.module, self.instance, self.activity, self.occurrence
        )
    }
}

/// Error parsing the CLI `year/module/instance/activity/occurrence` form.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseEventRefError(pub String);

impl fmt::Display for ParseEventRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid event reference '{}': expected year/module/instance/activity/occurrence",
            self.0
        )
    }
}

impl std::error::Error for ParseEventRefError {}

impl FromStr for EventRef {
    type Err = ParseEventRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        let [year, module, instance, activity, occurrence] = parts.as_slice() else {
            return Err(ParseEventRefError(s.to_string()));
        };
        if module.is_empty() || instance.is_empty() || activity.is_empty() || occurrence.is_empty()
        {
            return Err(ParseEventRefError(s.to_string()));
        }
        let year: i32 = year.parse().map_err(|_| ParseEventRefError(s.to_string()))?;
        Ok(EventRef {
            year,
            module: (*module).to_string(),
            instance: (*instance).to_string(),
            activity: (*activity).to_string(),
            occurrence: (*occurrence).to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
