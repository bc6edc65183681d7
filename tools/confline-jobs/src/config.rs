//! Batch job configuration loaded from environment variables.

use std::time::Duration;

use confline_conferences::config::{env_flag, env_or, provider_settings_from_env};
use confline_conferences::infra::provider::ProviderSettings;

/// Configuration shared by every job.
///
/// Loaded from env vars after `dotenv::dotenv().ok()`. Each job checks for the
/// database it needs, so a job never requires a URL it does not use.
#[derive(Debug)]
pub struct JobsConfig {
    /// Booking database (`DATABASE_URL`), used by `stats-snapshot` and `sync-numbers`.
    pub database_url: Option<String>,

    /// Analytics database holding `call_stats` (`STATS_DATABASE_URL`, falls
    /// back to `DATABASE_URL`).
    pub stats_database_url: Option<String>,

    /// `DB_TIMEOUT_SECS`, default 5.
    pub db_timeout: Duration,

    pub provider: ProviderSettings,

    /// `STATS_DRY_RUN=true`: walk the provider but write nothing.
    pub dry_run: bool,

    /// `STATS_SMALL_RUN=true`: only walk the first few numbers.
    pub small_run: bool,
}

impl JobsConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").ok();
        Self {
            stats_database_url: std::env::var("STATS_DATABASE_URL")
                .ok()
                .or_else(|| database_url.clone()),
            database_url,
            db_timeout: Duration::from_secs(env_or("DB_TIMEOUT_SECS", 5)),
            provider: provider_settings_from_env(),
            dry_run: env_flag("STATS_DRY_RUN"),
            small_run: env_flag("STATS_SMALL_RUN"),
        }
    }
}
