//! HTTP client for the intranet API.
//!
//! Every request is sent under the `/auth-{token}` path prefix (autologin
//! token). Every remote response is classified into the
//! `RosterSourceError` taxonomy — an unauthorized rejection additionally
//! fires `SessionProvider::on_session_invalid` so the re-login flow can
//! start outside this crate.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use epicheck_roster::{
    EventRef, PresenceStatus, Roster, RosterSource, RosterSourceError, SessionProvider,
};

use crate::wire::{roster_from_entries, PlanningEntry, RegisteredEntry, ScheduledActivity};

// ---------------------------------------------------------------------------
// IntraConfig
// ---------------------------------------------------------------------------

/// Connection parameters for the intranet.
#[derive(Debug, Clone)]
pub struct IntraConfig {
    /// Base URL without trailing slash, e.g. `https://intra.school.domain`.
    pub base_url: String,
    /// Whole-request timeout; there is no retry on top of it.
    pub timeout: Duration,
}

impl IntraConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(15),
        }
    }
}

// ---------------------------------------------------------------------------
// IntraClient
// ---------------------------------------------------------------------------

/// Authenticated intranet client. Cheap to clone via the inner reqwest
/// pool; one instance serves all screens.
pub struct IntraClient {
    http: reqwest::Client,
    base: String,
    session: Arc<dyn SessionProvider>,
}

impl IntraClient {
    pub fn new(config: IntraConfig, session: Arc<dyn SessionProvider>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("building intranet HTTP client")?;
        Ok(Self {
            http,
            base: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Cheap authenticated call so a stored token can be validated before
    /// any roster work starts.
    pub async fn verify_token(&self) -> Result<(), RosterSourceError> {
        let url = self.authed_url("/user/")?;
        let resp = self
            .http
            .get(url)
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(transport)?;
        self.check(resp, None).await?;
        Ok(())
    }

    /// The staff user's scheduled activity occurrences for one day, sorted
    /// by start time.
    pub async fn fetch_day(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ScheduledActivity>, RosterSourceError> {
        let day = date.format("%Y-%m-%d").to_string();
        let url = self.authed_url("/planning/load")?;
        let resp = self
            .http
            .get(url)
            .query(&[("format", "json"), ("start", day.as_str()), ("end", day.as_str())])
            .send()
            .await
            .map_err(transport)?;
        let resp = self.check(resp, None).await?;

        let entries: Vec<PlanningEntry> = resp.json().await.map_err(transport)?;
        let mut activities: Vec<ScheduledActivity> =
            entries.into_iter().map(ScheduledActivity::from).collect();
        activities.sort_by(|a, b| a.start.cmp(&b.start));
        debug!(date = %day, count = activities.len(), "planning fetched");
        Ok(activities)
    }

    // -- internals ----------------------------------------------------------

    fn authed_url(&self, path: &str) -> Result<String, RosterSourceError> {
        let token = self.session.token().ok_or(RosterSourceError::Auth)?;
        Ok(format!("{}/auth-{}{}", self.base, token.as_str(), path))
    }

    fn event_path(&self, event: &EventRef, tail: &str) -> Result<String, RosterSourceError> {
        self.authed_url(&format!(
            "/module/{}/{}/{}/{}/{}/{}",
            event.year, event.module, event.instance, event.activity, event.occurrence, tail
        ))
    }

    /// Split a response into success / classified failure. `login` gives
    /// submit calls their not-registered classification.
    async fn check(
        &self,
        resp: reqwest::Response,
        login: Option<&str>,
    ) -> Result<reqwest::Response, RosterSourceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(self.classify(status, &body, login))
    }

    fn classify(
        &self,
        status: StatusCode,
        body: &str,
        login: Option<&str>,
    ) -> RosterSourceError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(%status, "intranet rejected session");
                self.session.on_session_invalid();
                RosterSourceError::Auth
            }
            StatusCode::NOT_FOUND => RosterSourceError::NotFound,
            s => {
                if let Some(login) = login {
                    if is_not_registered(body) {
                        return RosterSourceError::NotRegistered {
                            login: login.to_string(),
                        };
                    }
                }
                RosterSourceError::Transient(format!("HTTP {s}: {}", truncate(body)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RosterSource impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl RosterSource for IntraClient {
    async fn fetch_roster(&self, event: &EventRef) -> Result<Roster, RosterSourceError> {
        let url = self.event_path(event, "registered")?;
        let resp = self
            .http
            .get(url)
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(transport)?;
        let resp = self.check(resp, None).await?;

        let entries: Vec<RegisteredEntry> = resp.json().await.map_err(transport)?;
        Ok(roster_from_entries(entries))
    }

    async fn submit_presence(
        &self,
        event: &EventRef,
        login: &str,
        status: PresenceStatus,
    ) -> Result<(), RosterSourceError> {
        let url = self.event_path(event, "updateregistered")?;
        // The login must round-trip byte-identical to what the roster
        // endpoint returned; it is form-encoded, never re-normalized.
        let form = [
            ("items[0][login]", login),
            ("items[0][present]", status.as_remote_str()),
        ];
        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(transport)?;
        let resp = self.check(resp, Some(login)).await?;

        // The update endpoint reports some rejections inside a 200 envelope.
        let body = resp.text().await.unwrap_or_default();
        if let Some(message) = error_envelope(&body) {
            if is_not_registered(&message) {
                return Err(RosterSourceError::NotRegistered {
                    login: login.to_string(),
                });
            }
            return Err(RosterSourceError::Transient(message));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn transport(e: reqwest::Error) -> RosterSourceError {
    if e.is_decode() {
        RosterSourceError::Decode(e.to_string())
    } else {
        RosterSourceError::Transient(e.to_string())
    }
}

fn is_not_registered(body: &str) -> bool {
    body.to_ascii_lowercase().contains("not registered")
}

/// Extract the message of a `{"error": ...}` envelope, if the body is one.
fn error_envelope(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let err = value.get("error")?;
    match err {
        Value::String(s) => Some(s.clone()),
        Value::Object(o) => o
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(err.to_string())),
        _ => Some(err.to_string()),
    }
}

fn truncate(body: &str) -> &str {
    let end = body
        .char_indices()
        .take(200)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &body[..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_handles_string_and_object_forms() {
        assert_eq!(
            error_envelope(r#"{"error":"not registered on this event"}"#).as_deref(),
            Some("not registered on this event")
        );
        assert_eq!(
            error_envelope(r#"{"error":{"message":"boom","code":12}}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(error_envelope(r#"{"ok":true}"#), None);
        assert_eq!(error_envelope("[]"), None);
        assert_eq!(error_envelope("not json"), None);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "é".repeat(300);
        let t = truncate(&s);
        assert_eq!(t.chars().count(), 200);
    }

    #[test]
    fn not_registered_detection_is_case_insensitive() {
        assert!(is_not_registered("User NOT Registered for event"));
        assert!(!is_not_registered("forbidden"));
    }
}
