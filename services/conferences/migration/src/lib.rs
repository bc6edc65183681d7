use sea_orm_migration::prelude::*;

mod m20201101_000001_create_phone_numbers;
mod m20201101_000002_create_conferences;
mod m20201101_000003_create_login_tokens;
mod m20201101_000004_create_stats;
mod m20201204_180832_add_user_timezone_offset;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20201101_000001_create_phone_numbers::Migration),
            Box::new(m20201101_000002_create_conferences::Migration),
            Box::new(m20201101_000003_create_login_tokens::Migration),
            Box::new(m20201101_000004_create_stats::Migration),
            Box::new(m20201204_180832_add_user_timezone_offset::Migration),
        ]
    }
}
