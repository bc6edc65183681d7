use sea_orm::entity::prelude::*;

/// Analytics row for one provider call history entry.
/// The table is dropped and rebuilt by every call-stats job run.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "call_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub phone_number: String,
    pub call_id: String,
    pub date_begin: chrono::DateTime<chrono::Utc>,
    pub date_end: chrono::DateTime<chrono::Utc>,
    pub duration_minutes: i32,
    pub count_participants: i32,
    pub count_connections: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
