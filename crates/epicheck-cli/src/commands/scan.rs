//! `epicheck scan <event>`: interactive scan loop over stdin.
//!
//! Each line is one raw scan (QR payload, email, or typed login). The feed
//! ends on EOF; closing stdin is the cancellation path.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, StreamExt};

use epicheck_intra::IntraClient;
use epicheck_roster::{feed, EventRef, RosterSource, ScanError, ScanSession};

pub async fn run(
    client: Arc<IntraClient>,
    domain: &str,
    event: EventRef,
    cooldown_secs: u64,
) -> Result<()> {
    let session = ScanSession::open(event, domain, client as Arc<dyn RosterSource>)
        .await
        .context("fetching roster")?
        .with_cooldown(Duration::from_secs(cooldown_secs));

    let snapshot = session.roster_snapshot().await;
    println!(
        "{} students registered; scan or type identifiers (EOF to stop)",
        snapshot.len()
    );

    let lines = BufReader::new(tokio::io::stdin()).lines();
    let scans = LinesStream::new(lines).filter_map(|line| line.ok());

    feed::drive(&session, scans, |raw, outcome| match outcome {
        Ok(report) => println!("ok    {} marked present", report.login()),
        Err(e @ (ScanError::Busy | ScanError::Cooldown)) => println!("drop  {raw}: {e}"),
        Err(e) => println!("fail  {raw}: {e}"),
    })
    .await;

    let marked = session
        .roster_snapshot()
        .await
        .students
        .iter()
        .filter(|s| s.presence == epicheck_roster::PresenceStatus::Present)
        .count();
    println!("done: {marked} marked present");
    Ok(())
}
