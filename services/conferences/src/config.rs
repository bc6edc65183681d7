use std::str::FromStr;
use std::time::Duration;

use crate::infra::provider::ProviderSettings;

const DEFAULT_PROVIDER_ENDPOINT: &str = "https://eu.api.ovh.com/1.0";

/// Read an optional env var, falling back to `default` when unset or unparsable.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag the way the cron scripts set them (`"true"` enables).
pub fn env_flag(key: &str) -> bool {
    std::env::var(key).is_ok_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Provider credentials and tuning, shared by the service and the batch jobs.
pub fn provider_settings_from_env() -> ProviderSettings {
    ProviderSettings {
        endpoint: std::env::var("PROVIDER_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_PROVIDER_ENDPOINT.to_owned())
            .trim_end_matches('/')
            .to_owned(),
        app_key: std::env::var("PROVIDER_APP_KEY").expect("PROVIDER_APP_KEY"),
        app_secret: std::env::var("PROVIDER_APP_SECRET").expect("PROVIDER_APP_SECRET"),
        consumer_key: std::env::var("PROVIDER_CONSUMER_KEY").expect("PROVIDER_CONSUMER_KEY"),
        account: std::env::var("PROVIDER_ACCOUNT_NUMBER").expect("PROVIDER_ACCOUNT_NUMBER"),
        timeout: Duration::from_secs(env_or("PROVIDER_TIMEOUT_SECS", 10)),
        max_retries: env_or("PROVIDER_MAX_RETRIES", 2),
    }
}

/// Conference service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ConferencesConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Connect/acquire timeout for the store. Env var: `DB_TIMEOUT_SECS` (default 5).
    pub db_timeout: Duration,
    pub provider: ProviderSettings,
    /// Digits in a conference PIN. Env var: `PIN_DIGITS` (default 4).
    pub pin_digits: u32,
    /// Lifetime of an unredeemed login token. Env var: `LOGIN_TOKEN_TTL_MINUTES` (default 60).
    pub login_token_ttl_minutes: i64,
    /// TCP port to listen on (default 3120). Env var: `CONFERENCES_PORT`.
    pub conferences_port: u16,
}

impl ConferencesConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            db_timeout: Duration::from_secs(env_or("DB_TIMEOUT_SECS", 5)),
            provider: provider_settings_from_env(),
            pin_digits: env_or("PIN_DIGITS", 4),
            login_token_ttl_minutes: env_or("LOGIN_TOKEN_TTL_MINUTES", 60),
            conferences_port: env_or("CONFERENCES_PORT", 3120),
        }
    }
}
