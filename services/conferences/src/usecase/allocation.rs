use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::domain::repository::PhoneNumberRepository;
use crate::domain::types::{MAX_ALLOCATION_ATTEMPTS, PhoneNumber};
use crate::error::ConfServiceError;

/// Hands out free phone numbers.
///
/// The store is the only synchronization point: a number is reserved with a
/// conditional update that re-checks `free_at < now`, so several service
/// instances can book concurrently without ever sharing a number. A booking
/// that loses the update to another one moves on to the next candidate.
pub struct Allocator<P: PhoneNumberRepository> {
    pub phone_numbers: P,
}

impl<P: PhoneNumberRepository> Allocator<P> {
    pub async fn book_next_free_phone_number(
        &self,
        duration_in_minutes: i32,
    ) -> Result<PhoneNumber, ConfServiceError> {
        if duration_in_minutes <= 0 {
            return Err(ConfServiceError::InvalidDuration);
        }

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let now = Utc::now();
            let candidate = self
                .phone_numbers
                .find_next_free(now)
                .await?
                .ok_or(ConfServiceError::NoAvailability)?;

            let free_at = now + Duration::minutes(i64::from(duration_in_minutes));
            let reserved = self
                .phone_numbers
                .reserve_if_free(&candidate.phone_number, now, free_at)
                .await?;

            if let Some(booked) = reserved {
                info!(
                    phone_number = %booked.phone_number,
                    free_at = %booked.free_at,
                    attempt,
                    "phone number booked"
                );
                return Ok(booked);
            }

            warn!(
                phone_number = %candidate.phone_number,
                attempt,
                "phone number taken by a concurrent booking"
            );
        }

        Err(ConfServiceError::AllocationRaceExhausted)
    }

    /// End the reservation on `phone_number` now. No-op when it is already free.
    pub async fn release_phone_number(&self, phone_number: &str) -> Result<bool, ConfServiceError> {
        let released = self.phone_numbers.release(phone_number, Utc::now()).await?;
        if released {
            info!(phone_number, "phone number released");
        }
        Ok(released)
    }
}
