use crate::dto::{respond, ApiResponse, Leaderboard};
use crate::leaderboard_service;
use crate::pool::Db;
use sea_orm_rocket::Connection;

#[get("/leaderboard?<page>&<limit>")]
pub async fn get(
    conn: Connection<'_, Db>,
    page: Option<i64>,
    limit: Option<i64>,
) -> ApiResponse<Leaderboard> {
    let db = conn.into_inner();
    respond(
        leaderboard_service::leaderboard(db, page, limit).await,
        "Error fetching leaderboard",
    )
}
