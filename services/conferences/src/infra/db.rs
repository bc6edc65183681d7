use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Schema, TransactionTrait,
    sea_query::{Expr, OnConflict, Table},
};
use uuid::Uuid;

use confline_conferences_schema::{call_stats, conferences, login_tokens, phone_numbers, stats};

use crate::domain::repository::{
    CallStatsRepository, ConferenceRepository, LoginTokenRepository, PhoneNumberRepository,
    StatsRepository,
};
use crate::domain::types::{CallHistory, CallStat, Conference, LoginToken, PhoneNumber, StatsPoint};
use crate::error::ConfServiceError;

/// Connect with bounded connect/acquire timeouts so a stalled store surfaces
/// as an error instead of a hung request.
pub async fn connect(url: &str, timeout: Duration) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(false);
    Database::connect(options)
        .await
        .with_context(|| format!("connect to database within {}s", timeout.as_secs()))
}

// ── PhoneNumber repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPhoneNumberRepository {
    pub db: DatabaseConnection,
}

impl PhoneNumberRepository for DbPhoneNumberRepository {
    async fn list_all(&self) -> Result<Vec<PhoneNumber>, ConfServiceError> {
        let models = phone_numbers::Entity::find()
            .order_by_asc(phone_numbers::Column::FreeAt)
            .all(&self.db)
            .await
            .context("list phone numbers")?;
        Ok(models.into_iter().map(phone_number_from_model).collect())
    }

    async fn count_free(&self, now: DateTime<Utc>) -> Result<u64, ConfServiceError> {
        let count = phone_numbers::Entity::find()
            .filter(phone_numbers::Column::FreeAt.lt(now))
            .count(&self.db)
            .await
            .context("count free phone numbers")?;
        Ok(count)
    }

    async fn find_next_free(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<PhoneNumber>, ConfServiceError> {
        let model = phone_numbers::Entity::find()
            .filter(phone_numbers::Column::FreeAt.lt(now))
            .order_by_asc(phone_numbers::Column::FreeAt)
            .limit(1)
            .one(&self.db)
            .await
            .context("find next free phone number")?;
        Ok(model.map(phone_number_from_model))
    }

    async fn reserve_if_free(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
        free_at: DateTime<Utc>,
    ) -> Result<Option<PhoneNumber>, ConfServiceError> {
        // The `free_at < now` re-check makes this a compare-and-swap: of two
        // bookings racing for the same row, only one update matches.
        let models = phone_numbers::Entity::update_many()
            .col_expr(phone_numbers::Column::FreeAt, Expr::value(free_at))
            .col_expr(
                phone_numbers::Column::Used,
                Expr::col(phone_numbers::Column::Used).add(1),
            )
            .filter(phone_numbers::Column::PhoneNumber.eq(phone_number))
            .filter(phone_numbers::Column::FreeAt.lt(now))
            .exec_with_returning(&self.db)
            .await
            .context("reserve phone number")?;
        Ok(models.into_iter().next().map(phone_number_from_model))
    }

    async fn release(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ConfServiceError> {
        let released = release_phone_number(&self.db, phone_number, now)
            .await
            .context("release phone number")?;
        Ok(released)
    }

    async fn insert_if_absent(&self, phone_number: &str) -> Result<bool, ConfServiceError> {
        let inserted = phone_numbers::Entity::insert(phone_numbers::ActiveModel {
            phone_number: Set(phone_number.to_owned()),
            free_at: Set(Utc::now()),
            used: Set(0),
        })
        .on_conflict(
            OnConflict::column(phone_numbers::Column::PhoneNumber)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("insert phone number")?;
        Ok(inserted > 0)
    }
}

async fn release_phone_number<C: ConnectionTrait>(
    db: &C,
    phone_number: &str,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let result = phone_numbers::Entity::update_many()
        .col_expr(phone_numbers::Column::FreeAt, Expr::value(now))
        .filter(phone_numbers::Column::PhoneNumber.eq(phone_number))
        .filter(phone_numbers::Column::FreeAt.gt(now))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

fn phone_number_from_model(model: phone_numbers::Model) -> PhoneNumber {
    PhoneNumber {
        phone_number: model.phone_number,
        free_at: model.free_at,
        used: model.used,
    }
}

// ── Conference repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbConferenceRepository {
    pub db: DatabaseConnection,
}

impl ConferenceRepository for DbConferenceRepository {
    async fn insert(&self, conference: &Conference) -> Result<(), ConfServiceError> {
        conferences::ActiveModel {
            id: Set(conference.id),
            email: Set(conference.email.clone()),
            phone_number: Set(conference.phone_number.clone()),
            duration_in_minutes: Set(conference.duration_in_minutes),
            expires_at: Set(conference.expires_at),
            canceled_at: Set(conference.canceled_at),
            created_at: Set(conference.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert conference")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conference>, ConfServiceError> {
        let model = conferences::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find conference by id")?;
        Ok(model.map(conference_from_model))
    }

    async fn find_unexpired(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Conference>, ConfServiceError> {
        let model = conferences::Entity::find_by_id(id)
            .filter(conferences::Column::CanceledAt.is_null())
            .filter(conferences::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .context("find unexpired conference")?;
        Ok(model.map(conference_from_model))
    }

    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Conference>, ConfServiceError> {
        let models = conferences::Entity::find()
            .filter(conferences::Column::CanceledAt.is_null())
            .filter(conferences::Column::ExpiresAt.gt(now))
            .order_by_asc(conferences::Column::ExpiresAt)
            .all(&self.db)
            .await
            .context("list live conferences")?;
        Ok(models.into_iter().map(conference_from_model).collect())
    }

    async fn cancel_and_release(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Conference>, ConfServiceError> {
        let canceled = self
            .db
            .transaction::<_, Option<conferences::Model>, DbErr>(move |txn| {
                Box::pin(async move {
                    // Conditional so that two concurrent cancels cannot both win.
                    let Some(model) = conferences::Entity::update_many()
                        .col_expr(conferences::Column::CanceledAt, Expr::value(now))
                        .filter(conferences::Column::Id.eq(id))
                        .filter(conferences::Column::CanceledAt.is_null())
                        .filter(conferences::Column::ExpiresAt.gt(now))
                        .exec_with_returning(txn)
                        .await?
                        .into_iter()
                        .next()
                    else {
                        return Ok(None);
                    };
                    release_phone_number(txn, &model.phone_number, now).await?;
                    Ok(Some(model))
                })
            })
            .await
            .context("cancel conference and release phone number")?;
        Ok(canceled.map(conference_from_model))
    }
}

fn conference_from_model(model: conferences::Model) -> Conference {
    Conference {
        id: model.id,
        email: model.email,
        phone_number: model.phone_number,
        duration_in_minutes: model.duration_in_minutes,
        expires_at: model.expires_at,
        canceled_at: model.canceled_at,
        created_at: model.created_at,
    }
}

// ── LoginToken repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbLoginTokenRepository {
    pub db: DatabaseConnection,
}

impl LoginTokenRepository for DbLoginTokenRepository {
    async fn insert(&self, token: &LoginToken) -> Result<(), ConfServiceError> {
        login_tokens::ActiveModel {
            token: Set(token.token.clone()),
            email: Set(token.email.clone()),
            duration_in_minutes: Set(token.duration_in_minutes),
            expires_at: Set(token.expires_at),
            user_timezone_offset: Set(token.user_timezone_offset),
        }
        .insert(&self.db)
        .await
        .context("insert login token")?;
        Ok(())
    }

    async fn take_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LoginToken>, ConfServiceError> {
        // Delete-on-read: the row that comes back is gone for everyone else.
        let models = login_tokens::Entity::delete_many()
            .filter(login_tokens::Column::Token.eq(token))
            .filter(login_tokens::Column::ExpiresAt.gt(now))
            .exec_with_returning(&self.db)
            .await
            .context("take login token")?;
        Ok(models.into_iter().next().map(login_token_from_model))
    }
}

fn login_token_from_model(model: login_tokens::Model) -> LoginToken {
    LoginToken {
        token: model.token,
        email: model.email,
        duration_in_minutes: model.duration_in_minutes,
        expires_at: model.expires_at,
        user_timezone_offset: model.user_timezone_offset,
    }
}

// ── Stats repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbStatsRepository {
    pub db: DatabaseConnection,
}

impl StatsRepository for DbStatsRepository {
    async fn insert(&self, point: &StatsPoint) -> Result<(), ConfServiceError> {
        stats::ActiveModel {
            id: Set(Uuid::new_v4()),
            date: Set(point.date),
            online_participants_count: Set(point.online_participants_count),
            active_confs_count: Set(point.active_confs_count),
            error_confs_count: Set(point.error_confs_count),
            free_phone_numbers_count: Set(point.free_phone_numbers_count),
        }
        .insert(&self.db)
        .await
        .context("insert stats point")?;
        Ok(())
    }

    async fn latest(&self, limit: u64) -> Result<Vec<StatsPoint>, ConfServiceError> {
        let models = stats::Entity::find()
            .order_by_desc(stats::Column::Date)
            .limit(limit)
            .all(&self.db)
            .await
            .with_context(|| format!("fetch latest {limit} stats points"))?;
        Ok(models.into_iter().map(stats_point_from_model).collect())
    }
}

fn stats_point_from_model(model: stats::Model) -> StatsPoint {
    StatsPoint {
        date: model.date,
        online_participants_count: model.online_participants_count,
        active_confs_count: model.active_confs_count,
        error_confs_count: model.error_confs_count,
        free_phone_numbers_count: model.free_phone_numbers_count,
    }
}

// ── CallStats repository ─────────────────────────────────────────────────────

/// Writes to the analytics database, which may differ from the booking one.
#[derive(Clone)]
pub struct DbCallStatsRepository {
    pub db: DatabaseConnection,
}

impl CallStatsRepository for DbCallStatsRepository {
    async fn drop_table(&self) -> Result<(), ConfServiceError> {
        let backend = self.db.get_database_backend();
        let stmt = Table::drop()
            .table(call_stats::Entity)
            .if_exists()
            .to_owned();
        self.db
            .execute(backend.build(&stmt))
            .await
            .context("drop call_stats table")?;
        Ok(())
    }

    async fn create_table(&self) -> Result<(), ConfServiceError> {
        let backend = self.db.get_database_backend();
        let stmt = Schema::new(backend).create_table_from_entity(call_stats::Entity);
        self.db
            .execute(backend.build(&stmt))
            .await
            .context("create call_stats table")?;
        Ok(())
    }

    async fn insert(&self, stat: &CallStat) -> Result<(), ConfServiceError> {
        let CallHistory {
            call_id,
            date_begin,
            date_end,
            count_participants,
            count_connections,
            duration_minutes,
        } = stat.history;
        call_stats::ActiveModel {
            id: Set(stat.id),
            phone_number: Set(stat.phone_number.clone()),
            call_id: Set(call_id.to_string()),
            date_begin: Set(date_begin),
            date_end: Set(date_end),
            duration_minutes: Set(duration_minutes),
            count_participants: Set(count_participants),
            count_connections: Set(count_connections),
        }
        .insert(&self.db)
        .await
        .with_context(|| format!("insert call stat {call_id} for {}", stat.phone_number))?;
        Ok(())
    }
}
