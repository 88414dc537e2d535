//! `epicheck mark <event> <login> --status present|absent`.

use std::sync::Arc;

use anyhow::{Context, Result};

use epicheck_intra::IntraClient;
use epicheck_roster::{EventRef, PresenceStatus, RosterSource, ScanSession};

/// Marks through a scan session so the submitted login is the roster-stored
/// one and unknown logins are rejected before reaching the remote.
pub async fn run(
    client: Arc<IntraClient>,
    domain: &str,
    event: EventRef,
    login: &str,
    status: PresenceStatus,
) -> Result<()> {
    let session = ScanSession::open(event, domain, client as Arc<dyn RosterSource>)
        .await
        .context("fetching roster")?;

    session.mark(login, status).await?;
    println!("{login} marked {status}");
    Ok(())
}
