//! `epicheck day [--date YYYY-MM-DD]`.

use anyhow::Result;
use chrono::NaiveDate;

use epicheck_intra::IntraClient;

pub async fn run(client: &IntraClient, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let activities = client.fetch_day(date).await?;

    if activities.is_empty() {
        println!("no scheduled activities on {date}");
        return Ok(());
    }

    for act in activities {
        let start = act.start.as_deref().unwrap_or("??:??");
        let end = act.end.as_deref().unwrap_or("??:??");
        let room = act.room.as_deref().unwrap_or("-");
        println!("{start} -> {end}  {:<40} room {room}  {}", act.title, act.event);
    }
    Ok(())
}
