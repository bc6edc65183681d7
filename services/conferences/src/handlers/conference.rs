use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::Conference;
use crate::error::ConfServiceError;
use crate::state::AppState;
use crate::usecase::conference::{
    BookConferenceUseCase, CancelConferenceUseCase, GetConferenceUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceResponse {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub duration_in_minutes: i32,
    #[serde(serialize_with = "confline_core::serde::to_rfc3339_ms")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "confline_core::serde::to_rfc3339_ms_opt")]
    pub canceled_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Conference> for ConferenceResponse {
    fn from(conf: Conference) -> Self {
        Self {
            id: conf.id,
            email: conf.email,
            phone_number: conf.phone_number,
            duration_in_minutes: conf.duration_in_minutes,
            expires_at: conf.expires_at,
            canceled_at: conf.canceled_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedConferenceResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub pin: String,
    #[serde(serialize_with = "confline_core::serde::to_rfc3339_ms")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize)]
pub struct BookConferenceRequest {
    pub token: String,
}

// ── POST /conferences ────────────────────────────────────────────────────────

pub async fn book_conference(
    State(state): State<AppState>,
    Json(body): Json<BookConferenceRequest>,
) -> Result<(StatusCode, Json<BookedConferenceResponse>), ConfServiceError> {
    let usecase = BookConferenceUseCase {
        tokens: state.login_token_repo(),
        conferences: state.conference_repo(),
        provisioner: state.provisioner(),
    };
    let booked = usecase.execute(&body.token).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookedConferenceResponse {
            id: booked.conference.id,
            phone_number: booked.conference.phone_number,
            pin: booked.pin,
            expires_at: booked.conference.expires_at,
        }),
    ))
}

// ── GET /conferences/{id} ────────────────────────────────────────────────────

pub async fn get_conference(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConferenceResponse>, ConfServiceError> {
    let usecase = GetConferenceUseCase {
        conferences: state.conference_repo(),
    };
    let conference = usecase.execute(id).await?;
    Ok(Json(conference.into()))
}

// ── DELETE /conferences/{id} ─────────────────────────────────────────────────

pub async fn cancel_conference(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConferenceResponse>, ConfServiceError> {
    let usecase = CancelConferenceUseCase {
        conferences: state.conference_repo(),
    };
    let conference = usecase.execute(id).await?;
    Ok(Json(conference.into()))
}
