use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // -1 is Paris winter time, the offset every pre-existing token was issued in.
        manager
            .alter_table(
                Table::alter()
                    .table(LoginTokens::Table)
                    .add_column(
                        ColumnDef::new(LoginTokens::UserTimezoneOffset)
                            .integer()
                            .not_null()
                            .default(-1),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(LoginTokens::Table)
                    .drop_column(LoginTokens::UserTimezoneOffset)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum LoginTokens {
    Table,
    UserTimezoneOffset,
}
