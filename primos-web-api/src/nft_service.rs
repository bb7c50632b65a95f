use crate::chain::NftChain;
use crate::dto::{NftPointsPreview, NftUsageStatus, WalletNfts};
use crate::error::{ApiError, Result};
use crate::leaderboard_service;
use crate::metadata::MetadataFetcher;
use crate::points::{self, NftBonus, NftKey, NftMetadata};
use crate::streak::{self, StreakUpdate};
use alloy::primitives::Address;
use chrono::{DateTime, NaiveDate, Utc};
use primos_db_entity::db::nft_usage_tracking::{Column as NftUsageColumn, Entity as NftUsage};
use primos_db_entity::db::nfts::{
    ActiveModel as NftActiveModel, Column as NftColumn, Entity as Nft, Model as NftModel,
};
use primos_db_entity::db::users::{Column as UserColumn, Entity as User};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use std::collections::HashSet;
use tracing::{info, warn};

/// A Primo as read from the chain, scored from its metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainPrimo {
    pub token_id: i64,
    pub metadata: Option<NftMetadata>,
    pub bonus: NftBonus,
}

/// Cached NFTs of a wallet with their summed bonus.
pub async fn wallet_nfts(db: &DatabaseConnection, wallet_address: &str) -> Result<WalletNfts> {
    let nfts = Nft::find()
        .filter(NftColumn::WalletAddress.eq(wallet_address))
        .order_by_asc(NftColumn::TokenId)
        .all(db)
        .await?;
    Ok(WalletNfts {
        count: nfts.len(),
        total_bonus_points: points::total_bonus(&nfts),
        nfts,
    })
}

/// Whether (`token_id`, `contract_address`) is already locked on `today`,
/// by any wallet.
pub async fn usage_status(
    db: &DatabaseConnection,
    token_id: i64,
    contract_address: &str,
    today: NaiveDate,
) -> Result<NftUsageStatus> {
    let usage = NftUsage::find()
        .filter(NftUsageColumn::TokenId.eq(token_id))
        .filter(NftUsageColumn::ContractAddress.eq(contract_address.to_lowercase()))
        .filter(NftUsageColumn::UsageDate.eq(today))
        .all(db)
        .await?;
    Ok(NftUsageStatus {
        is_used: !usage.is_empty(),
        usage,
    })
}

/// What a check-in at `now` would pay, without claiming anything. After
/// today's check-in nothing is left to earn and every NFT counts as locked.
pub async fn points_preview(
    db: &DatabaseConnection,
    wallet_address: &str,
    now: DateTime<Utc>,
) -> Result<NftPointsPreview> {
    let user = User::find()
        .filter(UserColumn::WalletAddress.eq(wallet_address))
        .one(db)
        .await?;
    let (streak, checked_in_today) = match &user {
        None => (1, false),
        Some(user) => match streak::next_streak(user.last_check_in, user.current_streak, now) {
            StreakUpdate::AlreadyCheckedIn => (user.current_streak, true),
            StreakUpdate::Advance { streak, .. } => (streak, false),
        },
    };
    let multiplier = streak::multiplier(streak);

    let owned = Nft::find()
        .filter(NftColumn::WalletAddress.eq(wallet_address))
        .order_by_asc(NftColumn::TokenId)
        .all(db)
        .await?;
    if checked_in_today {
        return Ok(NftPointsPreview {
            base_points: 0,
            multiplier,
            projected_points: 0,
            eligible_nfts: vec![],
            locked_nfts: owned,
        });
    }

    let locked: HashSet<NftKey> = NftUsage::find()
        .filter(NftUsageColumn::UsageDate.eq(now.date_naive()))
        .all(db)
        .await?
        .into_iter()
        .map(|usage| points::nft_key(&usage.contract_address, usage.token_id))
        .collect();
    let (locked_nfts, eligible_nfts): (Vec<NftModel>, Vec<NftModel>) = owned
        .into_iter()
        .partition(|nft| locked.contains(&points::nft_key(&nft.contract_address, nft.token_id)));

    let base_points = points::total_bonus(&eligible_nfts);
    Ok(NftPointsPreview {
        base_points,
        multiplier,
        projected_points: streak::points_earned(base_points, multiplier),
        eligible_nfts,
        locked_nfts,
    })
}

/// Reads every Primo `owner` holds and scores it. Metadata that cannot be
/// fetched scores zero.
pub async fn read_wallet_primos(
    chain: &dyn NftChain,
    fetcher: &MetadataFetcher,
    owner: Address,
) -> Result<Vec<ChainPrimo>> {
    let token_ids = chain.primo_token_ids(owner).await?;
    let mut primos = Vec::with_capacity(token_ids.len());
    for token_id in token_ids {
        let token_uri = chain.primo_token_uri(token_id).await?;
        let token_id: i64 = token_id
            .try_into()
            .map_err(|_| ApiError::Chain(format!("Token id out of range: {}", token_id)))?;
        let metadata = fetcher.fetch_or_none(&token_uri).await;
        let bonus = NftBonus::from_metadata(metadata.as_ref());
        primos.push(ChainPrimo {
            token_id,
            metadata,
            bonus,
        });
    }
    Ok(primos)
}

/// Replaces the cached NFTs of `wallet_address` with `primos` in one transaction.
/// A token cached under a previous owner moves to this wallet.
pub async fn replace_wallet_nfts(
    db: &DatabaseConnection,
    wallet_address: &str,
    contract_address: &str,
    primos: &[ChainPrimo],
    now: DateTime<Utc>,
) -> Result<Vec<NftModel>> {
    let txn = db.begin().await?;
    let removed = Nft::delete_many()
        .filter(NftColumn::WalletAddress.eq(wallet_address))
        .exec(&txn)
        .await?;

    if !primos.is_empty() {
        let rows = primos.iter().map(|primo| NftActiveModel {
            id: ActiveValue::NotSet,
            token_id: ActiveValue::Set(primo.token_id),
            wallet_address: ActiveValue::Set(wallet_address.to_owned()),
            contract_address: ActiveValue::Set(contract_address.to_lowercase()),
            rarity: ActiveValue::Set(primo.bonus.rarity.to_owned()),
            is_shiny: ActiveValue::Set(primo.bonus.is_shiny),
            is_z: ActiveValue::Set(primo.bonus.is_z),
            is_full_set: ActiveValue::Set(primo.bonus.is_full_set),
            bonus_points: ActiveValue::Set(primo.bonus.bonus_points),
            metadata: ActiveValue::Set(metadata_json(primo.metadata.as_ref())),
            updated_at: ActiveValue::Set(now),
        });
        Nft::insert_many(rows)
            .on_conflict(
                OnConflict::columns([NftColumn::TokenId, NftColumn::ContractAddress])
                    .update_columns([
                        NftColumn::WalletAddress,
                        NftColumn::Rarity,
                        NftColumn::IsShiny,
                        NftColumn::IsZ,
                        NftColumn::IsFullSet,
                        NftColumn::BonusPoints,
                        NftColumn::Metadata,
                        NftColumn::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }

    let nfts = Nft::find()
        .filter(NftColumn::WalletAddress.eq(wallet_address))
        .order_by_asc(NftColumn::TokenId)
        .all(&txn)
        .await?;
    txn.commit().await?;

    info!(
        "NFT cache for {}: removed {}, now {}",
        wallet_address,
        removed.rows_affected,
        nfts.len()
    );
    Ok(nfts)
}

fn metadata_json(metadata: Option<&NftMetadata>) -> serde_json::Value {
    metadata
        .and_then(|metadata| serde_json::to_value(metadata).ok())
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()))
}

/// Re-reads the wallet's Primos from the chain and replaces its cache. Chain
/// reads finish before any row is touched.
pub async fn refresh_wallet(
    db: &DatabaseConnection,
    chain: &dyn NftChain,
    fetcher: &MetadataFetcher,
    contract_address: &str,
    wallet_address: &str,
    now: DateTime<Utc>,
) -> Result<WalletNfts> {
    let owner = crate::wallet::parse_address(wallet_address)?;
    let primos = read_wallet_primos(chain, fetcher, owner).await?;
    let nfts = replace_wallet_nfts(db, wallet_address, contract_address, &primos, now).await?;

    let count = i32::try_from(nfts.len()).unwrap_or(i32::MAX);
    if let Err(error) = leaderboard_service::record_nft_count(db, wallet_address, count, now).await
    {
        warn!("Leaderboard nft_count update failed for {}: {}", wallet_address, error);
    }

    Ok(WalletNfts {
        count: nfts.len(),
        total_bonus_points: points::total_bonus(&nfts),
        nfts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::tests::FakeChain;
    use crate::metadata::RetryPolicy;
    use crate::points::tests::nft;
    use chrono::{Duration, TimeZone};
    use primos_db_entity::db::nft_usage_tracking::Model as NftUsageModel;
    use primos_db_entity::db::users::Model as UserModel;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::str::FromStr;

    const WALLET: &str = "0x00000000000000000000000000000000000000aa";
    const CONTRACT: &str = "0x23924869ff64ab205b3e3be388a373d75de74ebd";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
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

    fn owner() -> Address {
        Address::from_str(WALLET).unwrap()
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn usage(token_id: i64) -> NftUsageModel {
        NftUsageModel {
            id: 1,
            token_id,
            contract_address: CONTRACT.to_owned(),
            check_in_id: 3,
            usage_date: now().date_naive(),
            wallet_address: "0x00000000000000000000000000000000000000bb".to_owned(),
            created_at: now(),
        }
    }

    #[tokio::test]
    async fn reads_primos_in_chain_order() {
        let mut chain = FakeChain::default();
        chain.primos.insert(owner(), vec![1903, 12]);

        let primos = read_wallet_primos(&chain, &fetcher(), owner()).await.unwrap();
        let ids: Vec<i64> = primos.iter().map(|primo| primo.token_id).collect();
        assert_eq!(ids, vec![1903, 12]);
        // no token URI, no metadata, no bonus
        assert!(primos.iter().all(|primo| primo.bonus.bonus_points == 0));
    }

    #[tokio::test]
    async fn chain_failure_aborts_refresh_before_db() {
        let chain = FakeChain {
            fail: true,
            ..Default::default()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = refresh_wallet(&db, &chain, &fetcher(), CONTRACT, WALLET, now()).await;
        assert!(matches!(result, Err(ApiError::Chain(_))));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn refresh_replaces_cache_and_counts() {
        let mut chain = FakeChain::default();
        chain.primos.insert(owner(), vec![1, 2]);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(3), exec(2), exec(1)])
            .append_query_results([vec![nft(1, WALLET, 0), nft(2, WALLET, 0)]])
            .into_connection();

        let refreshed = refresh_wallet(&db, &chain, &fetcher(), CONTRACT, WALLET, now())
            .await
            .unwrap();
        assert_eq!(refreshed.count, 2);
        assert_eq!(refreshed.total_bonus_points, 0);
    }

    #[tokio::test]
    async fn empty_wallet_clears_cache() {
        let chain = FakeChain::default();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(4), exec(1)])
            .append_query_results([Vec::<NftModel>::new()])
            .into_connection();

        let refreshed = refresh_wallet(&db, &chain, &fetcher(), CONTRACT, WALLET, now())
            .await
            .unwrap();
        assert_eq!(refreshed.count, 0);
        assert!(refreshed.nfts.is_empty());
    }

    #[tokio::test]
    async fn cached_nfts_sum_bonus() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![nft(1, WALLET, 7), nft(2, WALLET, 15)]])
            .into_connection();

        let cached = wallet_nfts(&db, WALLET).await.unwrap();
        assert_eq!(cached.count, 2);
        assert_eq!(cached.total_bonus_points, 22);
    }

    #[tokio::test]
    async fn usage_status_reports_lock() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![usage(1903)]])
            .append_query_results([Vec::<NftUsageModel>::new()])
            .into_connection();

        let used = usage_status(&db, 1903, CONTRACT, now().date_naive())
            .await
            .unwrap();
        assert!(used.is_used);
        assert_eq!(used.usage.len(), 1);

        let free = usage_status(&db, 12, CONTRACT, now().date_naive())
            .await
            .unwrap();
        assert!(!free.is_used);
    }

    #[tokio::test]
    async fn preview_splits_locked_nfts() {
        let user = UserModel {
            id: 1,
            wallet_address: WALLET.to_owned(),
            current_streak: 14,
            max_streak: 14,
            total_check_ins: 14,
            last_check_in: Some(now() - Duration::days(1)),
            total_points: 0,
            created_at: now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([vec![nft(1, WALLET, 7), nft(2, WALLET, 30)]])
            .append_query_results([vec![usage(2)]])
            .into_connection();

        let preview = points_preview(&db, WALLET, now()).await.unwrap();
        // the next check-in makes the streak 15
        assert_eq!(preview.multiplier, 2.0);
        assert_eq!(preview.base_points, 7);
        assert_eq!(preview.projected_points, 14);
        assert_eq!(preview.locked_nfts.len(), 1);
        assert_eq!(preview.eligible_nfts[0].token_id, 1);
    }

    #[tokio::test]
    async fn preview_after_todays_check_in_pays_nothing() {
        let user = UserModel {
            id: 1,
            wallet_address: WALLET.to_owned(),
            current_streak: 3,
            max_streak: 3,
            total_check_ins: 3,
            last_check_in: Some(now() - Duration::hours(2)),
            total_points: 90,
            created_at: now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([vec![nft(5, WALLET, 30)]])
            .into_connection();

        let preview = points_preview(&db, WALLET, now()).await.unwrap();
        assert_eq!(preview.projected_points, 0);
        assert_eq!(preview.base_points, 0);
        assert!(preview.eligible_nfts.is_empty());
        assert_eq!(preview.locked_nfts.len(), 1);
        assert_eq!(preview.multiplier, 1.0);
    }
}
