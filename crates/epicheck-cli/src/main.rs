//! EpiCheck attendance CLI.
//!
//! Thin dispatch over the intranet client and the scan session; each
//! subcommand lives in `commands/`.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use epicheck_intra::{FileSession, IntraClient, IntraConfig, TokenStore};
use epicheck_roster::{EventRef, PresenceStatus};

mod commands;

#[derive(Parser)]
#[command(name = "epicheck")]
#[command(about = "EpiCheck attendance CLI", long_about = None)]
struct Cli {
    /// Intranet base URL (defaults to $EPICHECK_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Institutional email domain used for identifier matching
    /// (defaults to $EPICHECK_DOMAIN).
    #[arg(long)]
    domain: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify an autologin token against the intranet and cache it
    Login {
        token: String,
    },

    /// Forget the cached token
    Logout,

    /// List the day's scheduled activities
    Day {
        /// Date as YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },

    /// Show the registered students for an event
    /// (year/module/instance/activity/occurrence)
    Roster {
        event: EventRef,
    },

    /// Mark one student present or absent
    Mark {
        event: EventRef,
        /// Login exactly as listed by `roster`
        login: String,
        #[arg(long, value_enum)]
        status: MarkStatus,
    },

    /// Scan raw identifiers from stdin (one per line) and mark them present
    Scan {
        event: EventRef,
        /// Cool-down between resolved scans, in seconds
        #[arg(long, default_value_t = 3)]
        cooldown_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MarkStatus {
    Present,
    Absent,
}

impl From<MarkStatus> for PresenceStatus {
    fn from(s: MarkStatus) -> Self {
        match s {
            MarkStatus::Present => PresenceStatus::Present,
            MarkStatus::Absent => PresenceStatus::Absent,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Dev convenience; silent when the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let base_url = resolve(cli.base_url, "EPICHECK_BASE_URL", "https://intra.school.domain");
    let domain = resolve(cli.domain, "EPICHECK_DOMAIN", "school.domain");

    let store = TokenStore::from_env();

    // Constructing the client performs no IO, so it is safe to build it
    // before dispatch; `login` and `logout` simply never touch it.
    let session = Arc::new(FileSession::load(&store)?);
    let client = Arc::new(IntraClient::new(
        IntraConfig::new(&base_url),
        Arc::clone(&session) as Arc<dyn epicheck_roster::SessionProvider>,
    )?);

    let outcome = match cli.cmd {
        Commands::Login { token } => commands::login::run(&base_url, &store, &token).await,
        Commands::Logout => commands::login::logout(&store),
        Commands::Day { date } => commands::day::run(&client, date).await,
        Commands::Roster { event } => commands::roster::run(&client, event).await,
        Commands::Mark {
            event,
            login,
            status,
        } => commands::mark::run(client.clone(), &domain, event, &login, status.into()).await,
        Commands::Scan {
            event,
            cooldown_secs,
        } => commands::scan::run(client.clone(), &domain, event, cooldown_secs).await,
    };

    if session.was_invalidated() {
        eprintln!("session rejected by the intranet — run `epicheck login <token>` to re-authenticate");
    }
    outcome
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve(flag: Option<String>, env: &str, default: &str) -> String {
    flag.or_else(|| std::env::var(env).ok())
        .unwrap_or_else(|| default.to_string())
}
