use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A dial-in number from the provider inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    pub phone_number: String,
    pub free_at: DateTime<Utc>,
    pub used: i32,
}

impl PhoneNumber {
    pub fn is_free(&self, now: DateTime<Utc>) -> bool {
        self.free_at < now
    }
}

/// A booked conference line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conference {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub duration_in_minutes: i32,
    pub expires_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conference {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.canceled_at.is_none() && self.expires_at > now
    }
}

/// Single-use login token. Consumed by the first successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginToken {
    pub token: String,
    pub email: String,
    pub duration_in_minutes: i32,
    pub expires_at: DateTime<Utc>,
    pub user_timezone_offset: i32,
}

impl LoginToken {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// One sample of the usage time series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsPoint {
    pub date: DateTime<Utc>,
    pub online_participants_count: i32,
    pub active_confs_count: i32,
    pub error_confs_count: i32,
    pub free_phone_numbers_count: i32,
}

impl StatsPoint {
    /// Returned when the series is still empty so that readers always get a point.
    pub fn zeroed(date: DateTime<Utc>) -> Self {
        Self {
            date,
            online_participants_count: 0,
            active_confs_count: 0,
            error_confs_count: 0,
            free_phone_numbers_count: 0,
        }
    }
}

/// Detail of one past call on a provider number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHistory {
    pub call_id: u64,
    pub date_begin: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    pub count_participants: i32,
    pub count_connections: i32,
    pub duration_minutes: i32,
}

/// Analytics row written by the call-stats job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStat {
    pub id: Uuid,
    pub phone_number: String,
    pub history: CallHistory,
}

/// Length of a real dial-in number as reported by the provider ("0033111111111").
pub const PHONE_NUMBER_LEN: usize = 13;

/// Lost compare-and-swap races tolerated per booking before giving up.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

/// Numbers processed by the call-stats job in small-run mode.
pub const SMALL_RUN_NUMBERS: usize = 5;

/// Upper bound on stats points returned by one read.
pub const MAX_STATS_POINTS: u64 = 1000;

/// Random bytes behind each login token before base64 encoding.
pub const LOGIN_TOKEN_BYTES: usize = 256;

/// Default `user_timezone_offset` when the client does not send one.
pub const DEFAULT_USER_TIMEZONE_OFFSET: i32 = -1;

/// Keep the entries that are dial-in numbers.
///
/// The provider also lists number blocks such as `0033111111112-21` under the
/// same collection; those are dropped.
pub fn retain_phone_numbers(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|entry| entry.len() == PHONE_NUMBER_LEN)
        .collect()
}
