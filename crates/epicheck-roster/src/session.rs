//! Per-screen scan session: the `Idle -> Scanning -> Matching -> Submitting
//! -> Resolved` state machine around one roster snapshot.
//!
//! Concurrency guard is a boolean busy flag with drop semantics: at most one
//! scan is in flight per session, and a scan arriving while busy is dropped,
//! not queued. After a scan resolves (success or error) the session stays
//! closed for a fixed cool-down so the same physical card/code is not read
//! twice. Local recovery from any error only resets the flag back to idle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::matcher::{match_roster, MatchOutcome, ScanResult};
use crate::normalize::normalize;
use crate::source::{RosterSource, RosterSourceError};
use crate::types::{EventRef, PresenceStatus, Roster};

/// Default cool-down between resolved scans.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// ScanError
// ---------------------------------------------------------------------------

/// Classified outcome of a failed or dropped scan.
///
/// Every failure is surfaced as one of these variants, never as an
/// unhandled fault. None of them trigger an automatic retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Another scan is in flight; this one was dropped.
    Busy,
    /// A scan resolved less than the cool-down ago; this one was dropped.
    Cooldown,
    /// No roster entry matched. Carries the attempted identifiers for
    /// diagnostic display.
    NotFound { raw: String, bare: String },
    /// More than one roster entry matched the winning rule.
    Ambiguous { logins: Vec<String> },
    /// The remote rejected the session; the caller must re-authenticate.
    AuthExpired,
    /// The remote knows the login but it is not registered for this event.
    NotRegistered { login: String },
    /// Network failure or undecodable remote answer; the user may rescan.
    Transient(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Busy => write!(f, "scan dropped: another scan is in flight"),
            ScanError::Cooldown => write!(f, "scan dropped: cool-down after previous scan"),
            ScanError::NotFound { raw, bare } => {
                write!(f, "no roster entry matches '{raw}' (tried login '{bare}')")
            }
            ScanError::Ambiguous { logins } => {
                write!(f, "identifier matches several roster entries: {}", logins.join(", "))
            }
            ScanError::AuthExpired => write!(f, "session expired: please log in again"),
            ScanError::NotRegistered { login } => {
                write!(f, "'{login}' is not registered for this event")
            }
            ScanError::Transient(msg) => write!(f, "remote unavailable, rescan to retry: {msg}"),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<RosterSourceError> for ScanError {
    fn from(e: RosterSourceError) -> Self {
        match e {
            RosterSourceError::Auth => ScanError::AuthExpired,
            // An event losing its roster mid-session reads as a transient
            // condition from the scanner's point of view.
            RosterSourceError::NotFound => {
                ScanError::Transient("event roster disappeared".to_string())
            }
            RosterSourceError::NotRegistered { login } => ScanError::NotRegistered { login },
            RosterSourceError::Transient(msg) => ScanError::Transient(msg),
            RosterSourceError::Decode(msg) => ScanError::Transient(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// ScanReport
// ---------------------------------------------------------------------------

/// Successful scan: what was scanned, who it matched, what was marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub result: ScanResult,
    pub marked: PresenceStatus,
}

impl ScanReport {
    /// Login of the matched roster entry, as stored remotely.
    pub fn login(&self) -> &str {
        self.result
            .matched_student()
            .map(|s| s.login.as_str())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// ScanSession
// ---------------------------------------------------------------------------

/// One screen's attendance session for one event.
///
/// Owns the roster snapshot exclusively; nothing synchronizes it with other
/// clients. `scan` and `mark` share the busy flag, so at most one presence
/// submission is in flight at a time.
pub struct ScanSession {
    event: EventRef,
    domain: String,
    source: Arc<dyn RosterSource>,
    roster: RwLock<Roster>,
    busy: AtomicBool,
    cooldown: Duration,
    last_resolved: Mutex<Option<Instant>>,
}

impl ScanSession {
    /// Fetch the roster once and open a session over it.
    pub async fn open(
        event: EventRef,
        domain: impl Into<String>,
        source: Arc<dyn RosterSource>,
    ) -> Result<Self, RosterSourceError> {
        let roster = source.fetch_roster(&event).await?;
        info!(event = %event, students = roster.len(), "roster fetched");
        Ok(Self {
            event,
            domain: domain.into(),
            source,
            roster: RwLock::new(roster),
            busy: AtomicBool::new(false),
            cooldown: DEFAULT_COOLDOWN,
            last_resolved: Mutex::new(None),
        })
    }

    /// Override the resolved-scan cool-down (mainly for tests and kiosks
    /// with hardware debouncing of their own).
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn event(&self) -> &EventRef {
        &self.event
    }

    /// Point-in-time copy of the roster for list rendering.
    pub async fn roster_snapshot(&self) -> Roster {
        self.roster.read().await.clone()
    }

    /// Replace the roster wholesale with a fresh fetch.
    pub async fn refresh(&self) -> Result<(), RosterSourceError> {
        let fresh = self.source.fetch_roster(&self.event).await?;
        *self.roster.write().await = fresh;
        Ok(())
    }

    /// Process one raw scan: normalize, match, and mark the matched student
    /// present. Dropped (`Busy` / `Cooldown`) scans never reach the remote.
    pub async fn scan(&self, raw: &str) -> Result<ScanReport, ScanError> {
        self.acquire()?;
        let out = self.scan_inner(raw).await;
        self.resolve();
        out
    }

    /// Explicitly set a student's presence from the rendered list.
    ///
    /// `login` must be the roster-stored login (the list renders it), so no
    /// matching is involved; the same busy guard applies.
    pub async fn mark(&self, login: &str, status: PresenceStatus) -> Result<(), ScanError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScanError::Busy);
        }
        let out = self.mark_inner(login, status).await;
        self.busy.store(false, Ordering::Release);
        out
    }

    // -- internals ----------------------------------------------------------

    /// Take the busy flag and enforce the cool-down; both failures drop the
    /// scan without touching the remote.
    fn acquire(&self) -> Result<(), ScanError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("scan dropped: busy");
            return Err(ScanError::Busy);
        }

        let in_cooldown = self
            .last_resolved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .map(|t| t.elapsed() < self.cooldown)
            .unwrap_or(false);
        if in_cooldown {
            self.busy.store(false, Ordering::Release);
            debug!("scan dropped: cool-down");
            return Err(ScanError::Cooldown);
        }
        Ok(())
    }

    /// Record the resolved instant (success or error both start the
    /// cool-down) and return to idle.
    fn resolve(&self) {
        *self
            .last_resolved
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        self.busy.store(false, Ordering::Release);
    }

    async fn scan_inner(&self, raw: &str) -> Result<ScanReport, ScanError> {
        let normalized = normalize(raw);

        let result = {
            let roster = self.roster.read().await;
            ScanResult {
                raw_input: raw.to_string(),
                outcome: match_roster(&normalized, &roster, &self.domain),
                normalized,
            }
        };

        let student = match &result.outcome {
            MatchOutcome::Matched(s) => s.clone(),
            MatchOutcome::NotFound => {
                return Err(ScanError::NotFound {
                    raw: result.normalized.raw,
                    bare: result.normalized.bare,
                })
            }
            MatchOutcome::Ambiguous { logins } => {
                return Err(ScanError::Ambiguous {
                    logins: logins.clone(),
                })
            }
        };

        // Round-trip the login exactly as the roster stores it; never the
        // scanned or normalized form.
        self.source
            .submit_presence(&self.event, &student.login, PresenceStatus::Present)
            .await?;

        self.apply_local(&student.login, PresenceStatus::Present).await;
        info!(login = %student.login, event = %self.event, "marked present");

        Ok(ScanReport {
            result,
            marked: PresenceStatus::Present,
        })
    }

    async fn mark_inner(&self, login: &str, status: PresenceStatus) -> Result<(), ScanError> {
        let known = self.roster.read().await.find(login).is_some();
        if !known {
            return Err(ScanError::NotFound {
                raw: login.to_string(),
                bare: login.to_string(),
            });
        }

        self.source
            .submit_presence(&self.event, login, status)
            .await?;

        self.apply_local(login, status).await;
        info!(login = %login, status = %status, event = %self.event, "presence updated");
        Ok(())
    }

    /// Optimistic local update after a confirmed remote write; no re-fetch.
    async fn apply_local(&self, login: &str, status: PresenceStatus) {
        let mut roster = self.roster.write().await;
        if let Some(entry) = roster.find_mut(login) {
            entry.presence = status;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
