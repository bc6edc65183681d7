use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(confline_conferences_migration::Migrator).await;
}
