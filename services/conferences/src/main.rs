use tracing::info;

use confline_conferences::config::ConferencesConfig;
use confline_conferences::infra::db;
use confline_conferences::infra::provider::OvhConferenceProvider;
use confline_conferences::router::build_router;
use confline_conferences::state::AppState;
use confline_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ConferencesConfig::from_env();

    let db = db::connect(&config.database_url, config.db_timeout)
        .await
        .expect("failed to connect to database");

    let provider =
        OvhConferenceProvider::new(config.provider).expect("failed to build provider client");

    let state = AppState {
        db,
        provider,
        pin_digits: config.pin_digits,
        login_token_ttl_minutes: config.login_token_ttl_minutes,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.conferences_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("conferences service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
