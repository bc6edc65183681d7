#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    CallHistory, CallStat, Conference, LoginToken, PhoneNumber, StatsPoint,
};
use crate::error::ConfServiceError;

/// Persisted inventory of dial-in numbers.
pub trait PhoneNumberRepository: Send + Sync {
    /// All numbers, soonest-free first.
    async fn list_all(&self) -> Result<Vec<PhoneNumber>, ConfServiceError>;

    /// Count numbers with `free_at < now`.
    async fn count_free(&self, now: DateTime<Utc>) -> Result<u64, ConfServiceError>;

    /// The free number with the smallest `free_at`, if any.
    async fn find_next_free(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<PhoneNumber>, ConfServiceError>;

    /// Reserve `phone_number` until `free_at` and bump `used`, but only if it is
    /// still free at `now`. Returns the updated row, or `None` when another
    /// booking got there first.
    async fn reserve_if_free(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
        free_at: DateTime<Utc>,
    ) -> Result<Option<PhoneNumber>, ConfServiceError>;

    /// Set `free_at = now` if the number is currently reserved.
    /// Returns `true` if a reservation was cut short.
    async fn release(&self, phone_number: &str, now: DateTime<Utc>)
    -> Result<bool, ConfServiceError>;

    /// Insert a number that is free from now on. Returns `false` if it already exists.
    async fn insert_if_absent(&self, phone_number: &str) -> Result<bool, ConfServiceError>;
}

/// Persisted conferences.
pub trait ConferenceRepository: Send + Sync {
    async fn insert(&self, conference: &Conference) -> Result<(), ConfServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conference>, ConfServiceError>;

    /// Find a conference that is neither canceled nor expired at `now`.
    async fn find_unexpired(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Conference>, ConfServiceError>;

    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Conference>, ConfServiceError>;

    /// In one transaction: set `canceled_at = now` if the conference is still
    /// live, and end the reservation on its phone number. Returns the updated
    /// row, or `None` when nothing changed. On error neither write is kept.
    async fn cancel_and_release(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Conference>, ConfServiceError>;
}

/// Single-use login tokens.
pub trait LoginTokenRepository: Send + Sync {
    async fn insert(&self, token: &LoginToken) -> Result<(), ConfServiceError>;

    /// Delete and return the token if it has not expired at `now`.
    async fn take_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LoginToken>, ConfServiceError>;
}

/// Append-only usage time series.
pub trait StatsRepository: Send + Sync {
    async fn insert(&self, point: &StatsPoint) -> Result<(), ConfServiceError>;

    /// Most recent points first.
    async fn latest(&self, limit: u64) -> Result<Vec<StatsPoint>, ConfServiceError>;
}

/// Analytics table rebuilt by every call-stats run.
pub trait CallStatsRepository: Send + Sync {
    async fn drop_table(&self) -> Result<(), ConfServiceError>;

    async fn create_table(&self) -> Result<(), ConfServiceError>;

    async fn insert(&self, stat: &CallStat) -> Result<(), ConfServiceError>;
}

/// Port to the telephony provider's conference API.
pub trait ConferenceProvider: Send + Sync {
    /// Dial-in numbers on the account (number blocks filtered out).
    async fn list_phone_numbers(&self) -> Result<Vec<String>, ConfServiceError>;

    /// Participants currently connected. A line nobody is on counts as zero.
    async fn online_participants(&self, phone_number: &str) -> Result<u32, ConfServiceError>;

    async fn set_pin(&self, phone_number: &str, pin: &str) -> Result<(), ConfServiceError>;

    async fn participant_ids(&self, phone_number: &str) -> Result<Vec<u64>, ConfServiceError>;

    async fn kick_participant(
        &self,
        phone_number: &str,
        participant_id: u64,
    ) -> Result<(), ConfServiceError>;

    async fn call_ids(&self, phone_number: &str) -> Result<Vec<u64>, ConfServiceError>;

    async fn call_history(
        &self,
        phone_number: &str,
        call_id: u64,
    ) -> Result<CallHistory, ConfServiceError>;
}
