//! epicheck-roster
//!
//! Roster reconciliation core for EpiCheck attendance tracking.
//!
//! Architectural decisions:
//! - Scanned identifiers are normalized, then matched against a roster
//!   snapshot by an ordered precedence list (no scoring)
//! - A rule matching more than one roster entry is rejected as ambiguous,
//!   never silently resolved to the first hit
//! - Presence updates round-trip the login exactly as the remote returned it
//! - One scan in flight per session; extra scans are dropped, not queued
//!
//! Deterministic, pure logic plus the trait boundaries the IO layer plugs
//! into. No HTTP calls live in this crate.

pub mod feed;
pub mod matcher;
pub mod normalize;
pub mod session;
pub mod source;
pub mod types;

pub use matcher::{match_roster, MatchOutcome, ScanResult};
pub use normalize::{normalize, NormalizedLogin};
pub use session::{ScanError, ScanReport, ScanSession};
pub use source::{RosterSource, RosterSourceError, SessionProvider, Token};
pub use types::{EventRef, PresenceStatus, Roster, Student};
