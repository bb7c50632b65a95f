use primos_db_entity::db::nfts::Model as NftModel;
use rocket::serde::{Deserialize, Serialize};
use std::collections::HashSet;

const RARITY_TRAIT: &str = "Rarity";
const FULL_SET_TRAIT: &str = "Full Set";
const FULL_SET_BONUS: i32 = 2;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NftMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<NftAttribute>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NftAttribute {
    pub trait_type: String,
    pub value: rocket::serde::json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
}

impl NftMetadata {
    pub fn attribute(&self, trait_type: &str) -> Option<&rocket::serde::json::Value> {
        self.attributes
            .iter()
            .find(|attr| attr.trait_type == trait_type)
            .map(|attr| &attr.value)
    }

    pub fn rarity(&self) -> Option<String> {
        self.attribute(RARITY_TRAIT).map(|value| match value.as_str() {
            Some(text) => text.to_owned(),
            None => value.to_string(),
        })
    }

    pub fn is_full_set(&self) -> bool {
        self.attribute(FULL_SET_TRAIT)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}

/// Bonus derived from a Primo's metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NftBonus {
    pub rarity: String,
    pub is_shiny: bool,
    pub is_z: bool,
    pub is_full_set: bool,
    pub bonus_points: i32,
}

impl NftBonus {
    pub fn from_metadata(metadata: Option<&NftMetadata>) -> NftBonus {
        let metadata = match metadata {
            Some(metadata) => metadata,
            None => return NftBonus::default(),
        };
        let rarity = metadata.rarity().unwrap_or_default();
        let (rarity_points, is_shiny, is_z) = match rarity.as_str() {
            "unique" => (30, false, false),
            "shiny Z" => (13, true, true),
            "shiny" => (7, true, false),
            "original Z" => (4, false, true),
            "original" => (1, false, false),
            _ => (0, false, false),
        };
        let is_full_set = metadata.is_full_set();
        let bonus_points = rarity_points + if is_full_set { FULL_SET_BONUS } else { 0 };

        NftBonus {
            rarity,
            is_shiny,
            is_z,
            is_full_set,
            bonus_points,
        }
    }
}

/// (contract_address, token_id) of an NFT, contract lowercase.
pub type NftKey = (String, i64);

pub fn nft_key(contract_address: &str, token_id: i64) -> NftKey {
    (contract_address.to_lowercase(), token_id)
}

/// NFTs from `owned` that are not in today's global lock set.
pub fn eligible_nfts(owned: Vec<NftModel>, locked: &HashSet<NftKey>) -> Vec<NftModel> {
    owned
        .into_iter()
        .filter(|nft| !locked.contains(&nft_key(&nft.contract_address, nft.token_id)))
        .collect()
}

pub fn total_bonus(nfts: &[NftModel]) -> i64 {
    nfts.iter().map(|nft| nft.bonus_points.max(0) as i64).sum()
}
