pub mod check_ins;
pub mod evolutions;
pub mod leaderboard;
pub mod nft_usage_tracking;
pub mod nfts;
pub mod users;
