use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_ins", schema_name = "public")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub wallet_address: String,
    // UTC calendar day, one row per wallet and day
    pub check_in_date: Date,
    pub streak_count: i32,
    pub points_earned: i64,
    pub multiplier: f64,
    pub transaction_hash: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::nft_usage_tracking::Entity")]
    NftUsage,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::nft_usage_tracking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NftUsage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
