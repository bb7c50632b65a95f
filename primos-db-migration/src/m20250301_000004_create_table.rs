use primos_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000004_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(nfts::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(nfts::Column::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(nfts::Column::TokenId).big_integer().not_null())
                    .col(ColumnDef::new(nfts::Column::WalletAddress).string().not_null())
                    .col(
                        ColumnDef::new(nfts::Column::ContractAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(nfts::Column::Rarity)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(nfts::Column::IsShiny)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(nfts::Column::IsZ)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(nfts::Column::IsFullSet)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(nfts::Column::BonusPoints)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(nfts::Column::Metadata).json_binary().not_null())
                    .col(
                        ColumnDef::new(nfts::Column::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(nfts::Entity).to_owned())
            .await
    }
}
