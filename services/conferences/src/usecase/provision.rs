use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::RngExt;
use tracing::{info, warn};

use crate::domain::repository::{ConferenceProvider, PhoneNumberRepository};
use crate::error::ConfServiceError;
use crate::usecase::allocation::Allocator;

/// Largest PIN length whose range still fits in a `u64`.
const MAX_PIN_DIGITS: u32 = 18;

/// Uniformly random numeric PIN, zero-padded to `digits` characters.
pub fn generate_pin(digits: u32) -> String {
    let digits = digits.clamp(1, MAX_PIN_DIGITS);
    let value = rand::rng().random_range(0..10u64.pow(digits));
    format!("{value:0width$}", width = digits as usize)
}

#[derive(Debug, Clone)]
pub struct ProvisionedConference {
    pub phone_number: String,
    pub pin: String,
    pub free_at: DateTime<Utc>,
}

/// Stands up a usable line: reserve a number, set a fresh PIN, clear out
/// anyone still connected from a previous booking.
pub struct ConferenceProvisioner<P, V>
where
    P: PhoneNumberRepository,
    V: ConferenceProvider,
{
    pub allocator: Allocator<P>,
    pub provider: V,
    pub pin_digits: u32,
}

impl<P, V> ConferenceProvisioner<P, V>
where
    P: PhoneNumberRepository,
    V: ConferenceProvider,
{
    pub async fn create_conference(
        &self,
        email: &str,
        duration_in_minutes: i32,
    ) -> Result<ProvisionedConference, ConfServiceError> {
        let booked = self
            .allocator
            .book_next_free_phone_number(duration_in_minutes)
            .await?;
        let pin = generate_pin(self.pin_digits);

        if let Err(e) = self.prepare_line(&booked.phone_number, &pin).await {
            self.roll_back(&booked.phone_number).await;
            return Err(e);
        }

        info!(phone_number = %booked.phone_number, email, "conference provisioned");
        Ok(ProvisionedConference {
            phone_number: booked.phone_number,
            pin,
            free_at: booked.free_at,
        })
    }

    /// Give the number back after a failed provisioning step.
    /// The caller's error wins; a failed release is only logged.
    pub async fn roll_back(&self, phone_number: &str) {
        if let Err(e) = self.allocator.release_phone_number(phone_number).await {
            warn!(phone_number, error = %e, "could not release phone number after failure");
        }
    }

    async fn prepare_line(&self, phone_number: &str, pin: &str) -> Result<(), ConfServiceError> {
        self.provider.set_pin(phone_number, pin).await?;
        self.kick_all_participants(phone_number).await?;
        Ok(())
    }

    /// Kick every connected participant. Kicks run concurrently and a failed
    /// kick does not stop the others; any failure is reported afterwards.
    pub async fn kick_all_participants(&self, phone_number: &str) -> Result<usize, ConfServiceError> {
        let participant_ids = self.provider.participant_ids(phone_number).await?;
        let total = participant_ids.len();

        let results = join_all(
            participant_ids
                .iter()
                .map(|id| self.provider.kick_participant(phone_number, *id)),
        )
        .await;

        let mut failed = 0;
        for (id, result) in participant_ids.iter().zip(results) {
            if let Err(e) = result {
                failed += 1;
                warn!(phone_number, participant_id = id, error = %e, "participant kick failed");
            }
        }

        if failed > 0 {
            return Err(ConfServiceError::Provider(anyhow::anyhow!(
                "{failed} of {total} participant kicks failed on {phone_number}"
            )));
        }
        Ok(total)
    }
}
