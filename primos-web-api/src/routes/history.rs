use crate::dto::{respond, ApiResponse, CheckInHistory};
use crate::pool::Db;
use crate::{check_in_service, wallet};
use sea_orm_rocket::Connection;

#[get("/check-ins?<wallet_address>&<page>&<limit>")]
pub async fn get_check_in_history(
    conn: Connection<'_, Db>,
    wallet_address: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
) -> ApiResponse<CheckInHistory> {
    let db = conn.into_inner();
    let result = async {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        check_in_service::history(db, &wallet_address, page, limit).await
    }
    .await;
    respond(result, "Error fetching check-in history")
}
