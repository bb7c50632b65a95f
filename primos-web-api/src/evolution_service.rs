use crate::chain::{expand_erc1155_uri, NftChain};
use crate::dto::{token_id_from_value, EvolutionRequest, PrimoDetails, StoneBalance};
use crate::error::{ApiError, Result};
use crate::metadata::MetadataFetcher;
use crate::nft_service;
use crate::stones::{compatible_stones, StoneType};
use crate::wallet;
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Duration, Utc};
use primos_db_entity::db::evolutions::{
    ActiveModel as EvolutionActiveModel, Column as EvolutionColumn, Entity as Evolution,
    EvolutionStatus, Model as EvolutionModel,
};
use primos_db_entity::db::nfts::{Column as NftColumn, Entity as Nft};
use rocket::serde::json::Value;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

pub const EVOLUTION_HOURS: i64 = 48;

/// A validated evolution request.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEvolution {
    pub wallet_address: String,
    pub primo_token_id: i64,
    pub stone_type: StoneType,
    pub transaction_hash: Option<String>,
    pub metadata: Value,
}

fn required_token_id(value: &Option<Value>) -> Result<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => token_id_from_value(value)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid token id: {}", value))),
    }
}

pub fn validate(request: EvolutionRequest) -> Result<NewEvolution> {
    let missing = || ApiError::BadRequest("Missing required fields".to_owned());

    let wallet_address = request
        .wallet_address
        .filter(|address| !address.trim().is_empty())
        .ok_or_else(missing)?;
    let primo_token_id = required_token_id(&request.primo_token_id)?.ok_or_else(missing)?;
    let stone_type = request
        .stone_type
        .filter(|stone| !stone.trim().is_empty())
        .ok_or_else(missing)?;
    let stone_token_id = required_token_id(&request.stone_token_id)?.ok_or_else(missing)?;

    let wallet_address = wallet::normalize_address(&wallet_address)?;
    let stone_type = StoneType::from_str(stone_type.trim())
        .map_err(|_| ApiError::BadRequest(format!("Unknown stone type: {}", stone_type)))?;
    if stone_type.token_id() != stone_token_id {
        return Err(ApiError::BadRequest(format!(
            "Stone token id {} does not match {}",
            stone_token_id, stone_type
        )));
    }

    let metadata = match request.metadata {
        Some(metadata @ Value::Object(_)) => metadata,
        _ => Value::Object(Default::default()),
    };

    Ok(NewEvolution {
        wallet_address,
        primo_token_id,
        stone_type,
        transaction_hash: request
            .transaction_hash
            .map(|hash| hash.trim().to_owned())
            .filter(|hash| !hash.is_empty()),
        metadata,
    })
}

/// Evolutions of a wallet, newest first.
pub async fn list(db: &DatabaseConnection, wallet_address: &str) -> Result<Vec<EvolutionModel>> {
    let evolutions = Evolution::find()
        .filter(EvolutionColumn::WalletAddress.eq(wallet_address))
        .order_by_desc(EvolutionColumn::CreatedAt)
        .all(db)
        .await?;
    Ok(evolutions)
}

/// Records a pending evolution. When the Primo is cached for the wallet, its
/// rarity must be compatible with the stone.
pub async fn create(
    db: &DatabaseConnection,
    evolution: NewEvolution,
    now: DateTime<Utc>,
) -> Result<EvolutionModel> {
    let cached = Nft::find()
        .filter(NftColumn::WalletAddress.eq(evolution.wallet_address.as_str()))
        .filter(NftColumn::TokenId.eq(evolution.primo_token_id))
        .one(db)
        .await?;
    if let Some(primo) = cached {
        if !primo.rarity.is_empty() && !evolution.stone_type.is_compatible(&primo.rarity) {
            return Err(ApiError::BadRequest(format!(
                "{} is not compatible with {} Primos",
                evolution.stone_type.display_name(),
                primo.rarity
            )));
        }
    }

    let created = EvolutionActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        wallet_address: ActiveValue::Set(evolution.wallet_address),
        primo_token_id: ActiveValue::Set(evolution.primo_token_id),
        stone_type: ActiveValue::Set(evolution.stone_type.to_string()),
        stone_token_id: ActiveValue::Set(evolution.stone_type.token_id()),
        status: ActiveValue::Set(EvolutionStatus::Pending.to_string()),
        transaction_hash: ActiveValue::Set(evolution.transaction_hash),
        metadata: ActiveValue::Set(evolution.metadata),
        estimated_completion: ActiveValue::Set(now + Duration::hours(EVOLUTION_HOURS)),
        completed_at: ActiveValue::Set(None),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(None),
    }
    .insert(db)
    .await?;

    info!(
        "Evolution {} started: Primo #{} with {}",
        created.id, created.primo_token_id, created.stone_type
    );
    Ok(created)
}

/// Balance and artwork of every stone type for `owner`. Missing artwork does
/// not fail the call.
pub async fn stone_balances(
    chain: &dyn NftChain,
    fetcher: &MetadataFetcher,
    owner: Address,
) -> Result<Vec<StoneBalance>> {
    let mut stones = vec![];
    for stone_type in StoneType::all() {
        let stone_id = U256::from(stone_type.token_id());
        let balance = chain.stone_balance(owner, stone_id).await?;

        let image_url = match chain.stone_uri(stone_id).await {
            Ok(uri) => fetcher
                .fetch_or_none(&expand_erc1155_uri(&uri, stone_id))
                .await
                .map(|metadata| metadata.image)
                .filter(|image| !image.is_empty())
                .map(|image| fetcher.resolve(&image)),
            Err(error) => {
                warn!("No URI for {}: {}", stone_type, error);
                None
            }
        };

        stones.push(StoneBalance {
            stone_type,
            name: stone_type.display_name(),
            token_id: stone_type.token_id(),
            balance: u64::try_from(balance).unwrap_or(u64::MAX),
            image_url,
            compatible_with: stone_type.compatible_with(),
        });
    }
    Ok(stones)
}

/// Primos `owner` holds on chain with the stones each could take.
pub async fn wallet_primos(
    chain: &dyn NftChain,
    fetcher: &MetadataFetcher,
    owner: Address,
) -> Result<Vec<PrimoDetails>> {
    let primos = nft_service::read_wallet_primos(chain, fetcher, owner).await?;
    Ok(primos
        .into_iter()
        .map(|primo| {
            let (name, image) = match &primo.metadata {
                Some(metadata) if !metadata.name.is_empty() => {
                    (metadata.name.to_owned(), Some(metadata.image.to_owned()))
                }
                Some(metadata) => (
                    format!("PRIMO #{}", primo.token_id),
                    Some(metadata.image.to_owned()),
                ),
                None => (format!("PRIMO #{}", primo.token_id), None),
            };
            PrimoDetails {
                token_id: primo.token_id,
                name,
                image: image
                    .filter(|image| !image.is_empty())
                    .map(|image| fetcher.resolve(&image)),
                compatible_stones: compatible_stones(&primo.bonus.rarity),
                rarity: primo.bonus.rarity,
                is_shiny: primo.bonus.is_shiny,
                is_full_set: primo.bonus.is_full_set,
                bonus_points: primo.bonus.bonus_points,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::tests::FakeChain;
    use crate::metadata::RetryPolicy;
    use crate::points::tests::nft;
    use chrono::TimeZone;
    use primos_db_entity::db::nfts::Model as NftModel;
    use rocket::serde::json::json;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const WALLET: &str = "0x00000000000000000000000000000000000000aa";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
    }

    fn request(stone_type: &str, stone_token_id: Value) -> EvolutionRequest {
        EvolutionRequest {
            wallet_address: Some("0x00000000000000000000000000000000000000AA".to_owned()),
            primo_token_id: Some(json!(12)),
            stone_type: Some(stone_type.to_owned()),
            stone_token_id: Some(stone_token_id),
            transaction_hash: Some("0xburn".to_owned()),
            metadata: None,
        }
    }

    fn fetcher() -> MetadataFetcher {
        MetadataFetcher::new(
            reqwest::Client::new(),
            "https://ipfs.io/ipfs",
            RetryPolicy {
                attempts: 1,
                initial_delay: std::time::Duration::from_millis(1),
                backoff_factor: 2,
            },
        )
    }

    fn evolution_row(evolution: &NewEvolution) -> EvolutionModel {
        EvolutionModel {
            id: Uuid::new_v4(),
            wallet_address: evolution.wallet_address.to_owned(),
            primo_token_id: evolution.primo_token_id,
            stone_type: evolution.stone_type.to_string(),
            stone_token_id: evolution.stone_type.token_id(),
            status: "pending".to_owned(),
            transaction_hash: evolution.transaction_hash.to_owned(),
            metadata: json!({}),
            estimated_completion: now() + Duration::hours(48),
            completed_at: None,
            created_at: now(),
            updated_at: None,
        }
    }

    #[test]
    fn valid_request_is_normalized() {
        let evolution = validate(request("PRIMAL", json!("1"))).unwrap();
        assert_eq!(evolution.wallet_address, WALLET);
        assert_eq!(evolution.primo_token_id, 12);
        assert_eq!(evolution.stone_type, StoneType::Primal);
        assert_eq!(evolution.metadata, json!({}));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut missing_stone = request("PRIMAL", json!(1));
        missing_stone.stone_type = None;
        let error = validate(missing_stone).unwrap_err();
        assert_eq!(error.to_string(), "Missing required fields");

        let mut missing_primo = request("PRIMAL", json!(1));
        missing_primo.primo_token_id = Some(Value::Null);
        assert!(validate(missing_primo).is_err());
    }

    #[test]
    fn bad_wallet_and_stone_are_rejected() {
        let mut bad_wallet = request("PRIMAL", json!(1));
        bad_wallet.wallet_address = Some("not-a-wallet".to_owned());
        assert_eq!(
            validate(bad_wallet).unwrap_err().to_string(),
            "Invalid wallet address"
        );

        assert!(validate(request("FIRE_DUST", json!(1))).is_err());
        // MOUNT_X is id 2
        assert!(validate(request("MOUNT_X", json!(3))).is_err());
    }

    #[tokio::test]
    async fn creates_pending_evolution_with_eta() {
        let evolution = validate(request("PRIMAL", json!(1))).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<NftModel>::new()])
            .append_query_results([vec![evolution_row(&evolution)]])
            .into_connection();

        let created = create(&db, evolution, now()).await.unwrap();
        assert_eq!(created.status, "pending");
        assert_eq!(created.estimated_completion - created.created_at, Duration::hours(48));
    }

    #[tokio::test]
    async fn incompatible_cached_primo_is_rejected() {
        let evolution = validate(request("MOUNT_Y", json!(3))).unwrap();
        // cached as rarity "original"
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![nft(12, WALLET, 1)]])
            .into_connection();

        let result = create(&db, evolution, now()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn stone_balances_cover_every_stone() {
        let owner = Address::from_str(WALLET).unwrap();
        let mut chain = FakeChain::default();
        chain.stones.insert((owner, 2), 5);

        let stones = stone_balances(&chain, &fetcher(), owner).await.unwrap();
        assert_eq!(stones.len(), 3);
        let mount_x = stones
            .iter()
            .find(|stone| stone.stone_type == StoneType::MountX)
            .unwrap();
        assert_eq!(mount_x.balance, 5);
        assert_eq!(mount_x.token_id, 2);
        assert!(stones
            .iter()
            .filter(|stone| stone.stone_type != StoneType::MountX)
            .all(|stone| stone.balance == 0));
    }

    #[tokio::test]
    async fn primos_without_metadata_get_default_names() {
        let owner = Address::from_str(WALLET).unwrap();
        let mut chain = FakeChain::default();
        chain.primos.insert(owner, vec![7]);

        let primos = wallet_primos(&chain, &fetcher(), owner).await.unwrap();
        assert_eq!(primos.len(), 1);
        assert_eq!(primos[0].name, "PRIMO #7");
        assert!(primos[0].image.is_none());
        assert!(primos[0].compatible_stones.is_empty());
    }
}
