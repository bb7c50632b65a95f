use crate::dto::{CheckInHistory, CheckInResult, MAX_PAGE_LIMIT};
use crate::error::{ApiError, Result};
use crate::leaderboard_service::{self, page_window, total_pages};
use crate::points::{self, NftKey};
use crate::sql_stmt::{CHECK_IN_HISTORY, CHECK_IN_HISTORY_COUNT, CLAIM_NFT_USAGE, DB_BACKEND};
use crate::streak::{self, StreakUpdate};
use chrono::{DateTime, Utc};
use primos_db_entity::db::check_ins::{
    ActiveModel as CheckInActiveModel, Entity as CheckIn, Model as CheckInModel,
};
use primos_db_entity::db::nft_usage_tracking::{Column as NftUsageColumn, Entity as NftUsage};
use primos_db_entity::db::nfts::{Column as NftColumn, Entity as Nft, Model as NftModel};
use primos_db_entity::db::users::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, SqlErr, Statement, TransactionTrait,
};
use std::collections::HashSet;
use tracing::{info, warn};

/// Records today's check-in for `wallet_address` at `now`.
///
/// Everything up to the points total runs in one transaction; the leaderboard
/// row is refreshed after commit.
pub async fn check_in(
    db: &DatabaseConnection,
    wallet_address: &str,
    transaction_hash: Option<String>,
    now: DateTime<Utc>,
) -> Result<CheckInResult> {
    let transaction_hash = transaction_hash
        .map(|hash| hash.trim().to_owned())
        .filter(|hash| !hash.is_empty());

    let txn = db.begin().await?;
    let existing = User::find()
        .filter(UserColumn::WalletAddress.eq(wallet_address))
        .one(&txn)
        .await?;

    let (last_check_in, current_streak) = match &existing {
        Some(user) => (user.last_check_in, user.current_streak),
        None => (None, 0),
    };
    let (streak, streak_broken) = match streak::next_streak(last_check_in, current_streak, now) {
        StreakUpdate::AlreadyCheckedIn => return Err(ApiError::AlreadyCheckedIn),
        StreakUpdate::Advance { streak, broken } => (streak, broken),
    };

    let user = save_streak(&txn, existing, wallet_address, streak, now).await?;
    let multiplier = streak::multiplier(user.current_streak);

    let today = now.date_naive();
    let owned = Nft::find()
        .filter(NftColumn::WalletAddress.eq(wallet_address))
        .all(&txn)
        .await?;
    let locked: HashSet<NftKey> = NftUsage::find()
        .filter(NftUsageColumn::UsageDate.eq(today))
        .all(&txn)
        .await?
        .into_iter()
        .map(|usage| points::nft_key(&usage.contract_address, usage.token_id))
        .collect();
    let eligible = points::eligible_nfts(owned, &locked);
    let projected = streak::points_earned(points::total_bonus(&eligible), multiplier);

    let check_in = CheckInActiveModel {
        id: ActiveValue::NotSet,
        user_id: ActiveValue::Set(user.id),
        wallet_address: ActiveValue::Set(wallet_address.to_owned()),
        check_in_date: ActiveValue::Set(today),
        streak_count: ActiveValue::Set(user.current_streak),
        points_earned: ActiveValue::Set(projected),
        multiplier: ActiveValue::Set(multiplier),
        transaction_hash: ActiveValue::Set(transaction_hash),
        created_at: ActiveValue::Set(now),
    }
    .insert(&txn)
    .await
    .map_err(duplicate_as_checked_in)?;

    let (claimed, skipped) = claim_nfts(&txn, &check_in, eligible, now).await?;
    let points_earned = streak::points_earned(points::total_bonus(&claimed), multiplier);
    let check_in = if points_earned != check_in.points_earned {
        let mut active: CheckInActiveModel = check_in.into();
        active.points_earned = ActiveValue::Set(points_earned);
        active.update(&txn).await?
    } else {
        check_in
    };

    let user = if points_earned > 0 {
        let total_points = user.total_points + points_earned;
        let mut active: UserActiveModel = user.into();
        active.total_points = ActiveValue::Set(total_points);
        active.update(&txn).await?
    } else {
        user
    };
    txn.commit().await?;

    info!(
        "Check-in {} for {}: streak {}, multiplier {}, points {}",
        check_in.id, wallet_address, user.current_streak, multiplier, points_earned
    );

    if let Err(error) = leaderboard_service::record_check_in(db, &user, now).await {
        warn!("Leaderboard update failed for {}: {}", wallet_address, error);
    }

    Ok(CheckInResult {
        user,
        check_in,
        points_earned,
        multiplier,
        streak_broken,
        claimed_nfts: claimed.iter().map(|nft| nft.token_id).collect(),
        skipped_nfts: skipped.iter().map(|nft| nft.token_id).collect(),
    })
}

async fn save_streak(
    txn: &DatabaseTransaction,
    existing: Option<UserModel>,
    wallet_address: &str,
    streak: i32,
    now: DateTime<Utc>,
) -> Result<UserModel> {
    let user = match existing {
        None => {
            UserActiveModel {
                id: ActiveValue::NotSet,
                wallet_address: ActiveValue::Set(wallet_address.to_owned()),
                current_streak: ActiveValue::Set(streak),
                max_streak: ActiveValue::Set(streak),
                total_check_ins: ActiveValue::Set(1),
                last_check_in: ActiveValue::Set(Some(now)),
                total_points: ActiveValue::Set(0),
                created_at: ActiveValue::Set(now),
            }
            .insert(txn)
            .await
            // a concurrent first check-in of the same wallet
            .map_err(duplicate_as_checked_in)?
        }
        Some(user) => {
            let max_streak = user.max_streak.max(streak);
            let total_check_ins = user.total_check_ins + 1;
            let mut active: UserActiveModel = user.into();
            active.current_streak = ActiveValue::Set(streak);
            active.max_streak = ActiveValue::Set(max_streak);
            active.total_check_ins = ActiveValue::Set(total_check_ins);
            active.last_check_in = ActiveValue::Set(Some(now));
            active.update(txn).await?
        }
    };
    Ok(user)
}

/// Claims each eligible NFT for today. An NFT another check-in claimed first
/// ends up in the skipped list.
async fn claim_nfts(
    txn: &DatabaseTransaction,
    check_in: &CheckInModel,
    eligible: Vec<NftModel>,
    now: DateTime<Utc>,
) -> Result<(Vec<NftModel>, Vec<NftModel>)> {
    let mut claimed = vec![];
    let mut skipped = vec![];
    for nft in eligible {
        let result = txn
            .execute(Statement::from_sql_and_values(
                DB_BACKEND,
                CLAIM_NFT_USAGE,
                vec![
                    nft.token_id.into(),
                    nft.contract_address.to_lowercase().into(),
                    check_in.id.into(),
                    check_in.check_in_date.into(),
                    check_in.wallet_address.to_owned().into(),
                    now.into(),
                ],
            ))
            .await?;
        if result.rows_affected() == 1 {
            claimed.push(nft);
        } else {
            info!("NFT #{} already used today", nft.token_id);
            skipped.push(nft);
        }
    }
    Ok((claimed, skipped))
}

fn is_unique_violation(error: &DbErr) -> bool {
    matches!(error.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Unique key hits on `users.wallet_address` or (`wallet_address`,
/// `check_in_date`) mean the wallet already checked in today.
fn duplicate_as_checked_in(error: DbErr) -> ApiError {
    if is_unique_violation(&error) {
        ApiError::AlreadyCheckedIn
    } else {
        ApiError::Database(error)
    }
}

/// Check-ins for a wallet, newest first.
pub async fn history(
    db: &DatabaseConnection,
    wallet_address: &str,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<CheckInHistory> {
    let (offset, limit) = page_window(page, limit, MAX_PAGE_LIMIT)?;

    let total_records = db
        .query_one(Statement::from_sql_and_values(
            DB_BACKEND,
            CHECK_IN_HISTORY_COUNT,
            vec![wallet_address.into()],
        ))
        .await?
        .map(|row| row.try_get::<i64>("", "total_records"))
        .transpose()?
        .unwrap_or(0);

    let check_ins = if total_records == 0 {
        vec![]
    } else {
        CheckIn::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DB_BACKEND,
                CHECK_IN_HISTORY,
                vec![wallet_address.into(), offset.into(), limit.into()],
            ))
            .all(db)
            .await?
    };

    Ok(CheckInHistory {
        total_pages: total_pages(total_records, limit),
        check_ins,
    })
}
