use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Conferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Conferences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Conferences::Email).string().not_null())
                    .col(ColumnDef::new(Conferences::PhoneNumber).string().not_null())
                    .col(
                        ColumnDef::new(Conferences::DurationInMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conferences::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Conferences::CanceledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Conferences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Stats snapshots scan live conferences by expiry.
        manager
            .create_index(
                Index::create()
                    .table(Conferences::Table)
                    .col(Conferences::ExpiresAt)
                    .name("idx_conferences_expires_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Conferences::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Conferences {
    Table,
    Id,
    Email,
    PhoneNumber,
    DurationInMinutes,
    ExpiresAt,
    CanceledAt,
    CreatedAt,
}
