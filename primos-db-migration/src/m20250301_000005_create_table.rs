use primos_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000005_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(evolutions::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(evolutions::Column::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::WalletAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::PrimoTokenId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::StoneType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::StoneTokenId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::Status)
                            .string()
                            .not_null()
                            .default(evolutions::EvolutionStatus::Pending.to_string()),
                    )
                    .col(ColumnDef::new(evolutions::Column::TransactionHash).string())
                    .col(
                        ColumnDef::new(evolutions::Column::Metadata)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::EstimatedCompletion)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::CompletedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(evolutions::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(evolutions::Column::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(evolutions::Entity).to_owned())
            .await
    }
}
