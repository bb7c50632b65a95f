use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An NFT counted toward a check-in on `usage_date`. The unique index on
/// (token_id, contract_address, usage_date) is the global daily lock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nft_usage_tracking", schema_name = "public")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub token_id: i64,
    pub contract_address: String,
    pub check_in_id: i64,
    pub usage_date: Date,
    pub wallet_address: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::check_ins::Entity",
        from = "Column::CheckInId",
        to = "super::check_ins::Column::Id"
    )]
    CheckIn,
}

impl Related<super::check_ins::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckIn.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
