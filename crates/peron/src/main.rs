//! peron: TCDD seat-availability watcher.
//!
//! Subcommands:
//! - `daemon`: recover persisted watches and run until shutdown
//! - `stations`: print the upstream station list

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peron_monitor::MonitorConfig;
use peron_tcdd::TcddClient;

mod allowlist;
mod daemon;

const DEFAULT_API_URL: &str = "https://web-api-prod-ytp.tcddtasimacilik.gov.tr/tms";

#[derive(Parser)]
#[command(name = "peron")]
#[command(about = "TCDD seat-availability watcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watcher daemon (recovery, monitor tasks, snapshot mirroring)
    Daemon {
        /// Ticket-search gateway URL
        #[arg(long, env = "PERON_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Snapshot file for active watches
        #[arg(long, env = "PERON_DB_FILE", default_value = "watches.json")]
        db_file: PathBuf,

        /// Allowlist file of permitted chat ids
        #[arg(long, env = "PERON_USERS_FILE", default_value = "users.txt")]
        users_file: PathBuf,

        /// Hours a watch may run before continuation must be confirmed
        #[arg(long, default_value = "18")]
        job_timeout_hours: u64,

        /// Minutes the recipient has to confirm continuation
        #[arg(long, default_value = "10")]
        confirmation_timeout_minutes: u64,

        /// Base seconds between availability checks
        #[arg(long, default_value = "90")]
        base_interval_seconds: u64,

        /// Backoff ceiling in minutes under consecutive upstream errors
        #[arg(long, default_value = "30")]
        max_backoff_minutes: u64,

        /// Upper bound in seconds of the random jitter added to every wait
        #[arg(long, default_value = "20")]
        jitter_seconds: u64,

        /// Chat id that receives operational notices
        #[arg(long, env = "PERON_ADMIN_ID", default_value = "0")]
        admin_id: i64,
    },

    /// Print the upstream station list (id and name)
    Stations {
        /// Ticket-search gateway URL
        #[arg(long, env = "PERON_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "peron=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            api_url,
            db_file,
            users_file,
            job_timeout_hours,
            confirmation_timeout_minutes,
            base_interval_seconds,
            max_backoff_minutes,
            jitter_seconds,
            admin_id,
        } => {
            daemon::run(daemon::DaemonConfig {
                api_url,
                db_file,
                users_file,
                admin_id,
                monitor: MonitorConfig {
                    base_interval: Duration::from_secs(base_interval_seconds),
                    max_backoff: Duration::from_secs(max_backoff_minutes * 60),
                    jitter: Duration::from_secs(jitter_seconds),
                    job_timeout: Duration::from_secs(job_timeout_hours * 3600),
                    confirm_timeout: Duration::from_secs(confirmation_timeout_minutes * 60),
                },
            })
            .await
        }

        Commands::Stations { api_url } => list_stations(&api_url).await,
    }
}

async fn list_stations(api_url: &str) -> Result<()> {
    let client = TcddClient::new(api_url);
    let stations = client
        .list_stations()
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    for station in stations {
        println!("{:>6}  {}", station.id, station.name);
    }
    Ok(())
}
