//! Scheduled jobs for the conference line service.
//!
//! # Usage
//!
//! ```bash
//! # Rebuild the call_stats table without touching it
//! cargo run -p confline-jobs -- call-stats --dry-run
//!
//! # Append one usage sample to the stats series
//! cargo run -p confline-jobs -- stats-snapshot
//!
//! # Import new dial-in numbers from the provider
//! cargo run -p confline-jobs -- sync-numbers
//! ```

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use confline_conferences::infra::db::{
    self, DbCallStatsRepository, DbConferenceRepository, DbPhoneNumberRepository,
    DbStatsRepository,
};
use confline_conferences::infra::provider::OvhConferenceProvider;
use confline_conferences::usecase::call_stats::{CollectCallStatsOptions, CollectCallStatsUseCase};
use confline_conferences::usecase::number_sync::SyncPhoneNumbersUseCase;
use confline_conferences::usecase::stats::RecordStatsSnapshotUseCase;
use confline_core::tracing::init_tracing;

mod config;

use config::JobsConfig;

#[derive(Parser)]
#[command(about = "Scheduled jobs for the conference line service")]
struct Args {
    #[command(subcommand)]
    job: Job,
}

#[derive(Subcommand)]
enum Job {
    /// Rebuild the call_stats analytics table from provider call histories
    CallStats {
        /// Read everything, write nothing (also `STATS_DRY_RUN=true`)
        #[arg(long)]
        dry_run: bool,

        /// Only walk the first five numbers (also `STATS_SMALL_RUN=true`)
        #[arg(long)]
        small_run: bool,
    },
    /// Record one point of the usage time series
    StatsSnapshot,
    /// Import the provider's dial-in numbers into the inventory
    SyncNumbers,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = JobsConfig::from_env();
    let provider = OvhConferenceProvider::new(config.provider.clone())?;

    match args.job {
        Job::CallStats { dry_run, small_run } => {
            let url = config
                .stats_database_url
                .as_deref()
                .context("STATS_DATABASE_URL is not set")?;
            let stats_db = db::connect(url, config.db_timeout).await?;

            let usecase = CollectCallStatsUseCase {
                provider,
                call_stats: DbCallStatsRepository { db: stats_db },
                options: CollectCallStatsOptions {
                    dry_run: dry_run || config.dry_run,
                    small_run: small_run || config.small_run,
                },
            };
            let report = usecase.execute().await?;
            info!(?report, "call-stats done");
        }
        Job::StatsSnapshot => {
            let db = connect_booking_db(&config).await?;

            let usecase = RecordStatsSnapshotUseCase {
                conferences: DbConferenceRepository { db: db.clone() },
                phone_numbers: DbPhoneNumberRepository { db: db.clone() },
                stats: DbStatsRepository { db },
                provider,
            };
            let point = usecase.execute().await?;
            info!(?point, "stats-snapshot done");
        }
        Job::SyncNumbers => {
            let db = connect_booking_db(&config).await?;

            let usecase = SyncPhoneNumbersUseCase {
                provider,
                phone_numbers: DbPhoneNumberRepository { db },
            };
            let report = usecase.execute().await?;
            info!(?report, "sync-numbers done");
        }
    }

    Ok(())
}

async fn connect_booking_db(config: &JobsConfig) -> Result<sea_orm::DatabaseConnection> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
    db::connect(url, config.db_timeout).await
}
