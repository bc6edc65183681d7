use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbConferenceRepository, DbLoginTokenRepository, DbPhoneNumberRepository, DbStatsRepository,
};
use crate::infra::provider::OvhConferenceProvider;
use crate::usecase::allocation::Allocator;
use crate::usecase::provision::ConferenceProvisioner;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub provider: OvhConferenceProvider,
    pub pin_digits: u32,
    pub login_token_ttl_minutes: i64,
}

impl AppState {
    pub fn phone_number_repo(&self) -> DbPhoneNumberRepository {
        DbPhoneNumberRepository {
            db: self.db.clone(),
        }
    }

    pub fn conference_repo(&self) -> DbConferenceRepository {
        DbConferenceRepository {
            db: self.db.clone(),
        }
    }

    pub fn login_token_repo(&self) -> DbLoginTokenRepository {
        DbLoginTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn stats_repo(&self) -> DbStatsRepository {
        DbStatsRepository {
            db: self.db.clone(),
        }
    }

    pub fn allocator(&self) -> Allocator<DbPhoneNumberRepository> {
        Allocator {
            phone_numbers: self.phone_number_repo(),
        }
    }

    pub fn provisioner(
        &self,
    ) -> ConferenceProvisioner<DbPhoneNumberRepository, OvhConferenceProvider> {
        ConferenceProvisioner {
            allocator: self.allocator(),
            provider: self.provider.clone(),
            pin_digits: self.pin_digits,
        }
    }
}
