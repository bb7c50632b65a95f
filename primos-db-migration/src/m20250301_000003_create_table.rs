use primos_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000003_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(nft_usage_tracking::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(nft_usage_tracking::Column::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(nft_usage_tracking::Column::TokenId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(nft_usage_tracking::Column::ContractAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(nft_usage_tracking::Column::CheckInId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(nft_usage_tracking::Column::UsageDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(nft_usage_tracking::Column::WalletAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(nft_usage_tracking::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nft_usage_tracking_check_in_id")
                            .from(
                                nft_usage_tracking::Entity,
                                nft_usage_tracking::Column::CheckInId,
                            )
                            .to(check_ins::Entity, check_ins::Column::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(nft_usage_tracking::Entity).to_owned())
            .await
    }
}
