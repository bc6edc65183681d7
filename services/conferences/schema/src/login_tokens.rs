use sea_orm::entity::prelude::*;

/// Single-use login token. Deleted on first successful read.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "login_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub email: String,
    pub duration_in_minutes: i32,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    /// Browser-style offset in hours (UTC minus local time). -1 is Paris winter time.
    pub user_timezone_offset: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
