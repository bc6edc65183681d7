use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngExt;

use crate::domain::repository::LoginTokenRepository;
use crate::domain::types::{DEFAULT_USER_TIMEZONE_OFFSET, LOGIN_TOKEN_BYTES, LoginToken};
use crate::error::ConfServiceError;

fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..LOGIN_TOKEN_BYTES).map(|_| rng.random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct IssueLoginTokenInput {
    pub email: String,
    pub duration_in_minutes: i32,
    pub user_timezone_offset: Option<i32>,
}

/// Issue a single-use token that can later be redeemed for a conference.
/// Delivering it to the user (e.g. by email) is up to the caller.
pub struct IssueLoginTokenUseCase<T: LoginTokenRepository> {
    pub tokens: T,
    pub ttl_minutes: i64,
}

impl<T: LoginTokenRepository> IssueLoginTokenUseCase<T> {
    pub async fn execute(&self, input: IssueLoginTokenInput) -> Result<LoginToken, ConfServiceError> {
        if input.duration_in_minutes <= 0 {
            return Err(ConfServiceError::InvalidDuration);
        }

        let token = LoginToken {
            token: generate_token(),
            email: input.email,
            duration_in_minutes: input.duration_in_minutes,
            expires_at: Utc::now() + Duration::minutes(self.ttl_minutes),
            user_timezone_offset: input
                .user_timezone_offset
                .unwrap_or(DEFAULT_USER_TIMEZONE_OFFSET),
        };
        self.tokens.insert(&token).await?;
        Ok(token)
    }
}
