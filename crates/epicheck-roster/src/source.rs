//! Trait boundaries between the reconciliation core and the IO layer.
//!
//! The core never performs HTTP itself: it consumes a [`SessionProvider`]
//! for the current auth token and a [`RosterSource`] for the two remote
//! operations (roster fetch, presence submit). Concrete implementations
//! live in `epicheck-intra`; tests plug in in-process mocks.

use std::fmt;

use async_trait::async_trait;

use crate::types::{EventRef, PresenceStatus, Roster};

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Opaque credential proving the user authenticated to the intranet.
///
/// Debug output is redacted so a token never leaks into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Token(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(…)")
    }
}

// ---------------------------------------------------------------------------
// SessionProvider
// ---------------------------------------------------------------------------

/// Supplies the current session token and receives the unauthorized signal.
///
/// `on_session_invalid` is called by the roster source when the remote
/// rejects a request as unauthorized; the re-authentication flow it
/// triggers lives outside the core.
pub trait SessionProvider: Send + Sync {
    fn token(&self) -> Option<Token>;
    fn on_session_invalid(&self);
}

// ---------------------------------------------------------------------------
// RosterSourceError
// ---------------------------------------------------------------------------

/// Failure taxonomy for the remote roster operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSourceError {
    /// The remote rejected the request as unauthorized; re-login required.
    Auth,
    /// The event has no roster on the remote side.
    NotFound,
    /// The remote rejected the login as not registered for this event
    /// (submit only).
    NotRegistered { login: String },
    /// Network failure or remote unavailable. Not retried by the core; the
    /// user may rescan.
    Transient(String),
    /// The remote answered but the payload did not parse.
    Decode(String),
}

impl fmt::Display for RosterSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterSourceError::Auth => write!(f, "session rejected as unauthorized"),
            RosterSourceError::NotFound => write!(f, "event has no roster"),
            RosterSourceError::NotRegistered { login } => {
                write!(f, "login '{login}' is not registered for this event")
            }
            RosterSourceError::Transient(msg) => write!(f, "transient remote failure: {msg}"),
            RosterSourceError::Decode(msg) => write!(f, "remote payload did not decode: {msg}"),
        }
    }
}

impl std::error::Error for RosterSourceError {}

// ---------------------------------------------------------------------------
// RosterSource
// ---------------------------------------------------------------------------

/// Remote dependency owning the roster data and the presence updates.
///
/// Object-safe so callers can hold an `Arc<dyn RosterSource>` without
/// knowing the concrete transport.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Fetch the full roster for `event`. A refresh replaces the whole
    /// sequence; there is no partial update.
    async fn fetch_roster(&self, event: &EventRef) -> Result<Roster, RosterSourceError>;

    /// Overwrite the presence state of `login` for `event`.
    ///
    /// `login` must be the string exactly as stored in the roster entry —
    /// the remote requires a byte-identical round-trip. The remote treats
    /// the call as a plain overwrite, so repeating identical arguments is
    /// safe.
    async fn submit_presence(
        &self,
        event: &EventRef,
        login: &str,
        status: PresenceStatus,
    ) -> Result<(), RosterSourceError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
