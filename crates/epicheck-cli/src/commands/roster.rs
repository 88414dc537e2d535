//! `epicheck roster <event>`.

use anyhow::Result;

use epicheck_intra::IntraClient;
use epicheck_roster::{EventRef, RosterSource};

pub async fn run(client: &IntraClient, event: EventRef) -> Result<()> {
    let roster = client.fetch_roster(&event).await?;

    if roster.is_empty() {
        println!("no students registered for {event}");
        return Ok(());
    }

    println!("{} students registered for {event}", roster.len());
    for s in &roster.students {
        let name = s.display_name.as_deref().unwrap_or("-");
        println!("{:<9} {:<40} {name}", s.presence.to_string(), s.login);
    }
    Ok(())
}
