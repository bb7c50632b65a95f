use primos_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000007_create_index"
    }
}

const IDX_CHECK_INS_WALLET_DATE: &str = "idx_check_ins_wallet_address_check_in_date";
const IDX_NFT_USAGE_TOKEN_DATE: &str = "idx_nft_usage_tracking_token_contract_date";
const IDX_NFTS_TOKEN_CONTRACT: &str = "idx_nfts_token_id_contract_address";
const IDX_NFTS_WALLET: &str = "idx_nfts_wallet_address";
const IDX_EVOLUTIONS_WALLET: &str = "idx_evolutions_wallet_address";
const IDX_LEADERBOARD_POINTS: &str = "idx_leaderboard_points_earned";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name(IDX_CHECK_INS_WALLET_DATE)
                    .table(check_ins::Entity)
                    .col(check_ins::Column::WalletAddress)
                    .col(check_ins::Column::CheckInDate)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_NFT_USAGE_TOKEN_DATE)
                    .table(nft_usage_tracking::Entity)
                    .col(nft_usage_tracking::Column::TokenId)
                    .col(nft_usage_tracking::Column::ContractAddress)
                    .col(nft_usage_tracking::Column::UsageDate)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_NFTS_TOKEN_CONTRACT)
                    .table(nfts::Entity)
                    .col(nfts::Column::TokenId)
                    .col(nfts::Column::ContractAddress)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_NFTS_WALLET)
                    .table(nfts::Entity)
                    .col(nfts::Column::WalletAddress)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_EVOLUTIONS_WALLET)
                    .table(evolutions::Entity)
                    .col(evolutions::Column::WalletAddress)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_LEADERBOARD_POINTS)
                    .table(leaderboard::Entity)
                    .col(leaderboard::Column::PointsEarned)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_LEADERBOARD_POINTS)
                    .table(leaderboard::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_EVOLUTIONS_WALLET)
                    .table(evolutions::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name(IDX_NFTS_WALLET).table(nfts::Entity).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_NFTS_TOKEN_CONTRACT)
                    .table(nfts::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_NFT_USAGE_TOKEN_DATE)
                    .table(nft_usage_tracking::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_CHECK_INS_WALLET_DATE)
                    .table(check_ins::Entity)
                    .to_owned(),
            )
            .await
    }
}
