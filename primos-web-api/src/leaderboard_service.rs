use crate::dto::{Leaderboard, LeaderboardEntry, UserStats};
use crate::error::{ApiError, Result};
use crate::sql_stmt::{
    DB_BACKEND, LEADERBOARD, LEADERBOARD_COUNT, UPSERT_LEADERBOARD_NFT_COUNT,
    UPSERT_LEADERBOARD_STREAK, USER_RANK,
};
use crate::streak;
use chrono::{DateTime, Utc};
use primos_db_entity::db::users::{Column as UserColumn, Entity as User, Model as UserModel};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Statement};
use tracing::info;

pub const MAX_LEADERBOARD_LIMIT: i64 = 100;
const DEFAULT_LIMIT: i64 = 10;

/// Validates paging params and returns `(offset, limit)`. Pages start at 1.
pub fn page_window(page: Option<i64>, limit: Option<i64>, max_limit: i64) -> Result<(i64, i64)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT.min(max_limit));
    if limit > max_limit {
        return Err(ApiError::BadRequest(format!(
            "'limit' can not be more than {}",
            max_limit
        )));
    }
    if page < 1 || limit < 1 {
        return Err(ApiError::BadRequest(
            "'page' and 'limit' must be positive".to_owned(),
        ));
    }
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| ApiError::BadRequest("'page' is out of range".to_owned()))?;
    Ok((offset, limit))
}

pub fn total_pages(total_records: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    let if_remainder = if total_records % limit > 0 { 1 } else { 0 };
    (total_records / limit) + if_remainder
}

/// Upserts streaks, total points and last activity; `tokens_claimed` and
/// `nft_count` keep their stored values.
pub async fn record_check_in<C: ConnectionTrait>(
    db: &C,
    user: &UserModel,
    now: DateTime<Utc>,
) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DB_BACKEND,
        UPSERT_LEADERBOARD_STREAK,
        vec![
            user.wallet_address.to_owned().into(),
            user.max_streak.into(),
            user.current_streak.into(),
            user.total_points.into(),
            now.into(),
        ],
    ))
    .await?;
    Ok(())
}

pub async fn record_nft_count<C: ConnectionTrait>(
    db: &C,
    wallet_address: &str,
    nft_count: i32,
    now: DateTime<Utc>,
) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DB_BACKEND,
        UPSERT_LEADERBOARD_NFT_COUNT,
        vec![wallet_address.into(), nft_count.into(), now.into()],
    ))
    .await?;
    info!("Leaderboard nft_count for {} set to {}", wallet_address, nft_count);
    Ok(())
}

pub async fn leaderboard(
    db: &DatabaseConnection,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Leaderboard> {
    let (offset, limit) = page_window(page, limit, MAX_LEADERBOARD_LIMIT)?;

    let total_records = db
        .query_one(Statement::from_string(
            DB_BACKEND,
            LEADERBOARD_COUNT.to_owned(),
        ))
        .await?
        .map(|row| row.try_get::<i64>("", "total_records"))
        .transpose()?
        .unwrap_or(0);

    let rows = db
        .query_all(Statement::from_sql_and_values(
            DB_BACKEND,
            LEADERBOARD,
            vec![offset.into(), limit.into()],
        ))
        .await?;
    let entries = rows
        .iter()
        .map(LeaderboardEntry::new)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Leaderboard {
        total_pages: total_pages(total_records, limit),
        entries,
    })
}

pub async fn user_rank(db: &DatabaseConnection, wallet_address: &str) -> Result<Option<i64>> {
    let rank = db
        .query_one(Statement::from_sql_and_values(
            DB_BACKEND,
            USER_RANK,
            vec![wallet_address.into()],
        ))
        .await?
        .map(|row| row.try_get::<i64>("", "rank"))
        .transpose()?;
    Ok(rank)
}

/// Stored stats for a wallet, `None` when it never checked in.
pub async fn user_stats(
    db: &DatabaseConnection,
    wallet_address: &str,
    now: DateTime<Utc>,
) -> Result<Option<UserStats>> {
    let user = match User::find()
        .filter(UserColumn::WalletAddress.eq(wallet_address))
        .one(db)
        .await?
    {
        Some(user) => user,
        None => return Ok(None),
    };
    let rank = user_rank(db, wallet_address).await?;
    let checked_in_today = user
        .last_check_in
        .map(|last| streak::days_between(last.date_naive(), now.date_naive()) <= 0)
        .unwrap_or(false);

    Ok(Some(UserStats {
        multiplier: streak::multiplier(user.current_streak),
        rank,
        checked_in_today,
        user,
    }))
}
