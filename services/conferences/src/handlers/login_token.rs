use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::ConfServiceError;
use crate::state::AppState;
use crate::usecase::login_token::{IssueLoginTokenInput, IssueLoginTokenUseCase};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    pub email: String,
    pub duration_in_minutes: i32,
    pub user_timezone_offset: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenResponse {
    pub token: String,
    #[serde(serialize_with = "confline_core::serde::to_rfc3339_ms")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

// ── POST /auth/token ─────────────────────────────────────────────────────────

pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<IssueTokenRequest>,
) -> Result<(StatusCode, Json<IssueTokenResponse>), ConfServiceError> {
    let usecase = IssueLoginTokenUseCase {
        tokens: state.login_token_repo(),
        ttl_minutes: state.login_token_ttl_minutes,
    };
    let token = usecase
        .execute(IssueLoginTokenInput {
            email: body.email,
            duration_in_minutes: body.duration_in_minutes,
            user_timezone_offset: body.user_timezone_offset,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(IssueTokenResponse {
            token: token.token,
            expires_at: token.expires_at,
        }),
    ))
}
