use sea_orm::DbBackend;

pub const DB_BACKEND: DbBackend = DbBackend::Postgres;

pub const CHECK_IN_HISTORY: &str = r#"SELECT check_ins.id,
    check_ins.user_id,
    check_ins.wallet_address,
    check_ins.check_in_date,
    check_ins.streak_count,
    check_ins.points_earned,
    check_ins.multiplier,
    check_ins.transaction_hash,
    check_ins.created_at
    FROM check_ins
    WHERE wallet_address = $1
    ORDER BY check_in_date DESC OFFSET $2 ROWS LIMIT $3"#;

pub const CHECK_IN_HISTORY_COUNT: &str = r#"SELECT COUNT(*) AS total_records
    FROM check_ins
    WHERE wallet_address = $1"#;

/// Claims an NFT for today. Zero rows affected means another check-in holds it.
pub const CLAIM_NFT_USAGE: &str = r#"INSERT INTO nft_usage_tracking
    (token_id, contract_address, check_in_id, usage_date, wallet_address, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (token_id, contract_address, usage_date) DO NOTHING"#;

pub const UPSERT_LEADERBOARD_STREAK: &str = r#"INSERT INTO leaderboard
    (wallet_address, best_streak, current_streak, points_earned, tokens_claimed, nft_count, last_active, updated_at)
    VALUES ($1, $2, $3, $4, 0, 0, $5, $5)
    ON CONFLICT (wallet_address) DO UPDATE SET
    best_streak = EXCLUDED.best_streak,
    current_streak = EXCLUDED.current_streak,
    points_earned = EXCLUDED.points_earned,
    last_active = EXCLUDED.last_active,
    updated_at = EXCLUDED.updated_at"#;

pub const UPSERT_LEADERBOARD_NFT_COUNT: &str = r#"INSERT INTO leaderboard
    (wallet_address, best_streak, current_streak, points_earned, tokens_claimed, nft_count, last_active, updated_at)
    VALUES ($1, 0, 0, 0, 0, $2, $3, $3)
    ON CONFLICT (wallet_address) DO UPDATE SET
    nft_count = EXCLUDED.nft_count,
    last_active = EXCLUDED.last_active,
    updated_at = EXCLUDED.updated_at"#;

pub const LEADERBOARD: &str = r#"SELECT RANK() OVER (ORDER BY points_earned DESC) AS rank,
    leaderboard.wallet_address,
    leaderboard.best_streak,
    leaderboard.current_streak,
    leaderboard.points_earned,
    leaderboard.tokens_claimed,
    leaderboard.nft_count,
    leaderboard.last_active
    FROM leaderboard
    ORDER BY points_earned DESC, wallet_address OFFSET $1 ROWS LIMIT $2"#;

pub const LEADERBOARD_COUNT: &str = r#"SELECT COUNT(*) AS total_records FROM leaderboard"#;

pub const USER_RANK: &str = r#"SELECT S.rank FROM
    (SELECT RANK() OVER (ORDER BY points_earned DESC) AS rank,
    leaderboard.wallet_address
    FROM leaderboard) AS S
    WHERE S.wallet_address = $1"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nft_count_upsert_refreshes_activity_only() {
        let update = UPSERT_LEADERBOARD_NFT_COUNT
            .split("DO UPDATE SET")
            .nth(1)
            .unwrap();
        assert!(update.contains("nft_count = EXCLUDED.nft_count"));
        assert!(update.contains("last_active = EXCLUDED.last_active"));
        assert!(!update.contains("points_earned"));
        assert!(!update.contains("tokens_claimed"));
    }

    #[test]
    fn streak_upsert_keeps_claims_and_nft_count() {
        let update = UPSERT_LEADERBOARD_STREAK
            .split("DO UPDATE SET")
            .nth(1)
            .unwrap();
        assert!(!update.contains("tokens_claimed"));
        assert!(!update.contains("nft_count"));
    }
}
