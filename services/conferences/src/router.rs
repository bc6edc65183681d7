use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use confline_core::health::healthz;
use confline_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    conference::{book_conference, cancel_conference, get_conference},
    health::readyz,
    login_token::issue_token,
    stats::get_stats,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Login token
        .route("/auth/token", post(issue_token))
        // Conferences
        .route("/conferences", post(book_conference))
        .route(
            "/conferences/{id}",
            get(get_conference).delete(cancel_conference),
        )
        // Stats
        .route("/stats", get(get_stats))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
