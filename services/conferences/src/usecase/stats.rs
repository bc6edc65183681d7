use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

use crate::domain::repository::{
    ConferenceProvider, ConferenceRepository, PhoneNumberRepository, StatsRepository,
};
use crate::domain::types::{MAX_STATS_POINTS, StatsPoint};
use crate::error::ConfServiceError;

fn saturating_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// ── GetLatestStats ───────────────────────────────────────────────────────────

pub struct GetLatestStatsUseCase<S: StatsRepository> {
    pub stats: S,
}

impl<S: StatsRepository> GetLatestStatsUseCase<S> {
    /// Most recent `points` samples, newest first. An empty series yields a
    /// single zeroed point so that dashboards always have something to draw.
    pub async fn execute(&self, points: u64) -> Result<Vec<StatsPoint>, ConfServiceError> {
        let limit = points.clamp(1, MAX_STATS_POINTS);
        let latest = self.stats.latest(limit).await?;
        if latest.is_empty() {
            return Ok(vec![StatsPoint::zeroed(Utc::now())]);
        }
        Ok(latest)
    }
}

// ── RecordStatsSnapshot ──────────────────────────────────────────────────────

/// Sample live conferences, their online participants and the free number
/// pool, and append the result to the stats series.
pub struct RecordStatsSnapshotUseCase<C, P, S, V>
where
    C: ConferenceRepository,
    P: PhoneNumberRepository,
    S: StatsRepository,
    V: ConferenceProvider,
{
    pub conferences: C,
    pub phone_numbers: P,
    pub stats: S,
    pub provider: V,
}

impl<C, P, S, V> RecordStatsSnapshotUseCase<C, P, S, V>
where
    C: ConferenceRepository,
    P: PhoneNumberRepository,
    S: StatsRepository,
    V: ConferenceProvider,
{
    pub async fn execute(&self) -> Result<StatsPoint, ConfServiceError> {
        let now = Utc::now();
        let live = self.conferences.list_live(now).await?;

        let presence = join_all(
            live.iter()
                .map(|conf| self.provider.online_participants(&conf.phone_number)),
        )
        .await;

        let mut online: u64 = 0;
        let mut errors: u64 = 0;
        for (conf, result) in live.iter().zip(presence) {
            match result {
                Ok(count) => online += u64::from(count),
                Err(e) => {
                    errors += 1;
                    warn!(
                        conference_id = %conf.id,
                        phone_number = %conf.phone_number,
                        error = %e,
                        "presence query failed"
                    );
                }
            }
        }

        let free = self.phone_numbers.count_free(now).await?;
        let point = StatsPoint {
            date: now,
            online_participants_count: saturating_i32(online),
            active_confs_count: saturating_i32(live.len() as u64),
            error_confs_count: saturating_i32(errors),
            free_phone_numbers_count: saturating_i32(free),
        };
        self.stats.insert(&point).await?;

        info!(
            online = point.online_participants_count,
            active = point.active_confs_count,
            errors = point.error_confs_count,
            free = point.free_phone_numbers_count,
            "stats point recorded"
        );
        Ok(point)
    }
}
