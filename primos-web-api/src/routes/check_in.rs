use crate::dto::{respond, ApiResponse, AuthToken, CheckInRequest, CheckInResult};
use crate::pool::{Db, LoyaltyConfig};
use crate::routes::web3_auth;
use crate::{check_in_service, wallet};
use chrono::Utc;
use rocket::{serde::json::Json, State};
use sea_orm_rocket::Connection;
use tracing::info;

#[post("/check-in", format = "json", data = "<request>")]
pub async fn check_in(
    conn: Connection<'_, Db>,
    config: &State<LoyaltyConfig>,
    auth: Option<AuthToken<'_>>,
    request: Json<CheckInRequest>,
) -> ApiResponse<CheckInResult> {
    let db = conn.into_inner();
    let CheckInRequest {
        wallet_address,
        transaction_hash,
    } = request.into_inner();
    let result = async {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        web3_auth::authorize(config, auth.as_ref(), &wallet_address)?;
        info!("Check-in requested by {}", wallet_address);
        check_in_service::check_in(db, &wallet_address, transaction_hash, Utc::now()).await
    }
    .await;
    respond(result, "Check-in failed")
}
