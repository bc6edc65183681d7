use axum::{extract::State, http::StatusCode};

use confline_core::health::readiness;

use crate::state::AppState;

/// `GET /readyz`: ready once the store answers a ping.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(state.db.ping().await)
}
