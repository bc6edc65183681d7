use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::{Value, json};

use confline_conferences::infra::provider::{OvhConferenceProvider, ProviderSettings};
use confline_conferences::router::build_router;
use confline_conferences::state::AppState;

/// Router over `db` and a provider that is never reached.
fn server_over(db: DatabaseConnection) -> TestServer {
    let provider = OvhConferenceProvider::new(ProviderSettings {
        endpoint: "http://127.0.0.1:9".to_owned(),
        app_key: "app".to_owned(),
        app_secret: "secret".to_owned(),
        consumer_key: "consumer".to_owned(),
        account: "ovhtel-1".to_owned(),
        timeout: Duration::from_millis(100),
        max_retries: 0,
    })
    .unwrap();
    let state = AppState {
        db,
        provider,
        pin_digits: 4,
        login_token_ttl_minutes: 60,
    };
    TestServer::new(build_router(state)).unwrap()
}

/// Router whose handlers never reach the store.
fn offline_server() -> TestServer {
    server_over(DatabaseConnection::Disconnected)
}

#[tokio::test]
async fn healthz_is_ok_and_tags_the_request() {
    let server = offline_server();

    let resp = server.get("/healthz").await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn readyz_fails_without_database() {
    let server = offline_server();

    let resp = server.get("/readyz").await;

    assert_eq!(resp.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn issue_token_rejects_zero_duration() {
    let server = offline_server();

    let resp = server
        .post("/auth/token")
        .json(&json!({ "email": "a@b.com", "durationInMinutes": 0 }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "INVALID_DURATION");
}

#[tokio::test]
async fn store_failure_is_a_persistence_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset".to_owned())])
        .into_connection();
    let server = server_over(db);

    let resp = server
        .post("/conferences")
        .json(&json!({ "token": "whatever" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "PERSISTENCE");
    assert_eq!(body["message"], "persistence error");
}

#[tokio::test]
async fn malformed_conference_id_is_rejected() {
    let server = offline_server();

    let resp = server.get("/conferences/not-a-uuid").await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
}
