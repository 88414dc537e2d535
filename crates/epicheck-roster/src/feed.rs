//! Scan-feed plumbing.
//!
//! Hardware scanners (camera QR decoder, NFC reader, keyboard wedge) are
//! modeled as a cancellable subscription yielding raw scan strings — a
//! `Stream`, not nested callbacks. Dropping the stream cancels acquisition;
//! an in-flight network call is allowed to complete in background.

use futures_util::{Stream, StreamExt};

use crate::session::{ScanError, ScanReport, ScanSession};

/// Consume raw scans from `feed`, driving `session` and handing each
/// classified outcome to `on_outcome`.
///
/// Scans are processed one at a time; the session's busy flag and cool-down
/// additionally guard against a second handle scanning concurrently.
/// Returns when the feed ends (subscription cancelled or input closed).
pub async fn drive<F>(
    session: &ScanSession,
    mut feed: F,
    mut on_outcome: impl FnMut(&str, Result<ScanReport, ScanError>),
) where
    F: Stream<Item = String> + Unpin,
{
    while let Some(raw) = feed.next().await {
        if raw.trim().is_empty() {
            continue;
        }
        let outcome = session.scan(&raw).await;
        on_outcome(&raw, outcome);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RosterSource, RosterSourceError};
    use crate::types::{EventRef, PresenceStatus, Roster, Student};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticSource(Roster);

    #[async_trait]
    impl RosterSource for StaticSource {
        async fn fetch_roster(&self, _event: &EventRef) -> Result<Roster, RosterSourceError> {
            Ok(self.0.clone())
        }

        async fn submit_presence(
            &self,
            _event: &EventRef,
            _login: &str,
            _status: PresenceStatus,
        ) -> Result<(), RosterSourceError> {
            Ok(())
        }
    }

    fn event() -> EventRef {
        EventRef {
            year: 2025,
            module: "B-INN-000".to_string(),
            instance: "PAR-0-1".to_string(),
            activity: "acti-1".to_string(),
            occurrence: "event-1".to_string(),
        }
    }

    #[tokio::test]
    async fn drive_processes_feed_in_order_and_skips_blanks() {
        let roster = Roster::new(vec![Student {
            login: "marie.curie".to_string(),
            email: None,
            display_name: None,
            presence: PresenceStatus::Unknown,
        }]);
        let session = ScanSession::open(event(), "school.domain", Arc::new(StaticSource(roster)))
            .await
            .unwrap()
            .with_cooldown(Duration::ZERO);

        let feed = futures_util::stream::iter(vec![
            "marie.curie".to_string(),
            "   ".to_string(),
            "nobody".to_string(),
        ]);

        let mut seen = Vec::new();
        drive(&session, feed, |raw, outcome| {
            seen.push((raw.to_string(), outcome.is_ok()));
        })
        .await;

        assert_eq!(
            seen,
            vec![
                ("marie.curie".to_string(), true),
                ("nobody".to_string(), false),
            ]
        );
    }
}
