use crate::dto::{respond, ApiResponse, ResponseData, UserStats, RESPONSE_OK};
use crate::pool::Db;
use crate::{leaderboard_service, wallet};
use chrono::Utc;
use sea_orm_rocket::Connection;
use tracing::warn;

#[get("/user?<wallet_address>")]
pub async fn get_user(
    conn: Connection<'_, Db>,
    wallet_address: Option<String>,
) -> ApiResponse<UserStats> {
    let db = conn.into_inner();
    let result = async {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        leaderboard_service::user_stats(db, &wallet_address, Utc::now())
            .await
            .map(|stats| (wallet_address, stats))
    }
    .await;

    match result {
        Ok((wallet_address, None)) => {
            let message = format!("User not found: {}", wallet_address);
            warn!("{}", message);
            ResponseData::new(RESPONSE_OK, message, None).into_response()
        }
        Ok((_, Some(stats))) => respond(Ok(stats), "Error fetching user"),
        Err(error) => respond(Err(error), "Error fetching user"),
    }
}
