use sea_orm::entity::prelude::*;

/// Provider-managed dial-in number.
/// Free when `free_at` is in the past, reserved until `free_at` otherwise.
/// Rows are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "phone_numbers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub phone_number: String,
    pub free_at: chrono::DateTime<chrono::Utc>,
    pub used: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
