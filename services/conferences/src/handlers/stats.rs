use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::domain::types::StatsPoint;
use crate::error::ConfServiceError;
use crate::state::AppState;
use crate::usecase::stats::GetLatestStatsUseCase;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPointResponse {
    #[serde(serialize_with = "confline_core::serde::to_rfc3339_ms")]
    pub date: chrono::DateTime<chrono::Utc>,
    pub online_participants_count: i32,
    pub active_confs_count: i32,
    pub error_confs_count: i32,
    pub free_phone_numbers_count: i32,
}

impl From<StatsPoint> for StatsPointResponse {
    fn from(point: StatsPoint) -> Self {
        Self {
            date: point.date,
            online_participants_count: point.online_participants_count,
            active_confs_count: point.active_confs_count,
            error_confs_count: point.error_confs_count,
            free_phone_numbers_count: point.free_phone_numbers_count,
        }
    }
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub points: Option<u64>,
}

// ── GET /stats ───────────────────────────────────────────────────────────────

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<StatsPointResponse>>, ConfServiceError> {
    let usecase = GetLatestStatsUseCase {
        stats: state.stats_repo(),
    };
    let points = usecase.execute(query.points.unwrap_or(1)).await?;
    Ok(Json(points.into_iter().map(Into::into).collect()))
}
