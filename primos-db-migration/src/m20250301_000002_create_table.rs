use primos_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000002_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(check_ins::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(check_ins::Column::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(check_ins::Column::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(check_ins::Column::WalletAddress)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(check_ins::Column::CheckInDate).date().not_null())
                    .col(
                        ColumnDef::new(check_ins::Column::StreakCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(check_ins::Column::PointsEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(check_ins::Column::Multiplier)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(ColumnDef::new(check_ins::Column::TransactionHash).string())
                    .col(
                        ColumnDef::new(check_ins::Column::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_ins_user_id")
                            .from(check_ins::Entity, check_ins::Column::UserId)
                            .to(users::Entity, users::Column::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(check_ins::Entity).to_owned())
            .await
    }
}
