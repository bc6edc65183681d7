use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Conference service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ConfServiceError {
    #[error("no phone number available")]
    NoAvailability,
    #[error("conference not found")]
    ConferenceNotFound,
    #[error("login token not found")]
    TokenNotFound,
    #[error("invalid duration")]
    InvalidDuration,
    #[error("phone number allocation lost too many races")]
    AllocationRaceExhausted,
    #[error("provider error: {0:#}")]
    Provider(#[source] anyhow::Error),
    #[error("persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl ConfServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoAvailability => "NO_AVAILABILITY",
            Self::ConferenceNotFound => "CONFERENCE_NOT_FOUND",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::InvalidDuration => "INVALID_DURATION",
            Self::AllocationRaceExhausted => "ALLOCATION_RACE_EXHAUSTED",
            Self::Provider(_) => "PROVIDER",
            Self::Persistence(_) => "PERSISTENCE",
        }
    }

    /// Message safe to hand to HTTP clients. Upstream and store details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Provider(_) => "provider error".to_owned(),
            Self::Persistence(_) => "persistence error".to_owned(),
            _ => self.to_string(),
        }
    }

    /// Wrap an upstream failure with the provider operation it came from.
    pub fn provider(operation: &str, err: impl Into<anyhow::Error>) -> Self {
        Self::Provider(err.into().context(operation.to_owned()))
    }
}

impl IntoResponse for ConfServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NoAvailability | Self::ConferenceNotFound | Self::TokenNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidDuration => StatusCode::BAD_REQUEST,
            Self::AllocationRaceExhausted => StatusCode::CONFLICT,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // tower-http TraceLayer already records method/uri/status for every request.
        // Upstream and store failures additionally need their context chain,
        // which their Display carries.
        if matches!(self, Self::Provider(_) | Self::Persistence(_)) {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.public_message(),
        });
        (status, axum::Json(body)).into_response()
    }
}
