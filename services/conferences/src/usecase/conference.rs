use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::repository::{
    ConferenceProvider, ConferenceRepository, LoginTokenRepository, PhoneNumberRepository,
};
use crate::domain::types::Conference;
use crate::error::ConfServiceError;
use crate::usecase::provision::ConferenceProvisioner;

// ── BookConference ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct BookedConference {
    pub conference: Conference,
    pub pin: String,
}

/// Redeem a login token for a provisioned, persisted conference.
pub struct BookConferenceUseCase<T, C, P, V>
where
    T: LoginTokenRepository,
    C: ConferenceRepository,
    P: PhoneNumberRepository,
    V: ConferenceProvider,
{
    pub tokens: T,
    pub conferences: C,
    pub provisioner: ConferenceProvisioner<P, V>,
}

impl<T, C, P, V> BookConferenceUseCase<T, C, P, V>
where
    T: LoginTokenRepository,
    C: ConferenceRepository,
    P: PhoneNumberRepository,
    V: ConferenceProvider,
{
    pub async fn execute(&self, token: &str) -> Result<BookedConference, ConfServiceError> {
        // 1. Consume the token → 404 if unknown, expired or already used
        let login = self
            .tokens
            .take_valid(token, Utc::now())
            .await?
            .ok_or(ConfServiceError::TokenNotFound)?;

        // 2. Reserve a number and prepare the line on the provider
        let provisioned = self
            .provisioner
            .create_conference(&login.email, login.duration_in_minutes)
            .await?;

        // 3. Persist; the reservation is handed back if that fails
        let conference = Conference {
            id: Uuid::new_v4(),
            email: login.email,
            phone_number: provisioned.phone_number,
            duration_in_minutes: login.duration_in_minutes,
            expires_at: provisioned.free_at,
            canceled_at: None,
            created_at: Utc::now(),
        };
        if let Err(e) = self.conferences.insert(&conference).await {
            self.provisioner.roll_back(&conference.phone_number).await;
            return Err(e);
        }

        info!(conference_id = %conference.id, phone_number = %conference.phone_number, "conference booked");
        Ok(BookedConference {
            conference,
            pin: provisioned.pin,
        })
    }
}

// ── GetConference ────────────────────────────────────────────────────────────

pub struct GetConferenceUseCase<C: ConferenceRepository> {
    pub conferences: C,
}

impl<C: ConferenceRepository> GetConferenceUseCase<C> {
    pub async fn execute(&self, id: Uuid) -> Result<Conference, ConfServiceError> {
        self.conferences
            .find_unexpired(id, Utc::now())
            .await?
            .ok_or(ConfServiceError::ConferenceNotFound)
    }
}

// ── CancelConference ─────────────────────────────────────────────────────────

/// Cancel a conference and free its number.
///
/// The cancel and the release are committed together. Cancelling a conference
/// that is already canceled or expired returns the stored record unchanged;
/// only the call that actually flips `canceled_at` releases the number.
pub struct CancelConferenceUseCase<C: ConferenceRepository> {
    pub conferences: C,
}

impl<C: ConferenceRepository> CancelConferenceUseCase<C> {
    pub async fn execute(&self, id: Uuid) -> Result<Conference, ConfServiceError> {
        if let Some(canceled) = self.conferences.cancel_and_release(id, Utc::now()).await? {
            info!(conference_id = %id, phone_number = %canceled.phone_number, "conference canceled");
            return Ok(canceled);
        }

        let existing = self
            .conferences
            .find_by_id(id)
            .await?
            .ok_or(ConfServiceError::ConferenceNotFound)?;
        warn!(conference_id = %id, "cancel on a conference that is no longer live");
        Ok(existing)
    }
}
