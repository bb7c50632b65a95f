use crate::error::{ApiError, Result};
use crate::stones::StoneType;
use chrono::{DateTime, Utc};
use primos_db_entity::db::check_ins::Model as CheckInModel;
use primos_db_entity::db::nft_usage_tracking::Model as NftUsageModel;
use primos_db_entity::db::nfts::Model as NftModel;
use primos_db_entity::db::users::Model as UserModel;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::{Json, Value};
use rocket::serde::{Deserialize, Serialize};
use sea_orm::QueryResult;
use std::fmt;
use tracing::{error, warn};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ResponseData<T> {
    pub code: Option<u16>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ResponseData<T> {
    pub fn new(code: u16, message: String, data: Option<T>) -> ResponseData<T> {
        ResponseData {
            code: Some(code),
            status_code: None,
            message,
            data,
        }
    }

    pub fn from_error(error: &ApiError) -> ResponseData<T> {
        ResponseData::new(error.code(), error.public_message(), None)
    }

    /// Pairs the envelope with the HTTP status matching its `code`.
    pub fn into_response(self) -> ApiResponse<T> {
        let status = self
            .code
            .and_then(Status::from_code)
            .unwrap_or(Status::InternalServerError);
        (status, Json(self))
    }
}

pub type ApiResponse<T> = (Status, Json<ResponseData<T>>);

/// Shapes a service result into the envelope. Server-side failures are logged
/// with their details; the caller only sees the public message.
pub fn respond<T>(result: Result<T>, context: &str) -> ApiResponse<T> {
    match result {
        Ok(data) => ResponseData::new(RESPONSE_OK, String::new(), Some(data)).into_response(),
        Err(api_error) => {
            if api_error.code() >= RESPONSE_INTERNAL_ERROR {
                error!("{}: {}", context, api_error);
            } else {
                warn!("{}: {}", context, api_error);
            }
            ResponseData::from_error(&api_error).into_response()
        }
    }
}

pub const RESPONSE_OK: u16 = 200;
pub const RESPONSE_BAD_REQUEST: u16 = 400;
pub const RESPONSE_UNAUTHORIZED: u16 = 401;
pub const RESPONSE_INTERNAL_ERROR: u16 = 500;
pub const RESPONSE_MAINTENANCE: u16 = 503;

pub const MAX_PAGE_LIMIT: i64 = 15;

#[derive(Debug)]
pub struct AuthToken<'r>(&'r str);

#[derive(Debug)]
pub enum ApiKeyError {
    Missing,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken<'r> {
    type Error = ApiKeyError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.headers().get_one("Authorization") {
            None => Outcome::Error((Status::Unauthorized, ApiKeyError::Missing)),
            Some(key) => Outcome::Success(AuthToken(key)),
        }
    }
}

impl<'r> AuthToken<'r> {
    /// The token with any `Bearer ` scheme prefix removed.
    pub fn token(&self) -> &'r str {
        self.0.strip_prefix("Bearer ").unwrap_or(self.0).trim()
    }
}

impl<'r> fmt::Display for AuthToken<'r> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "{}", self.token())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CheckInRequest {
    pub wallet_address: Option<String>,
    pub transaction_hash: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CheckInResult {
    pub user: UserModel,
    pub check_in: CheckInModel,
    pub points_earned: i64,
    pub multiplier: f64,
    pub streak_broken: bool,
    pub claimed_nfts: Vec<i64>,
    pub skipped_nfts: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CheckInHistory {
    pub total_pages: i64,
    pub check_ins: Vec<CheckInModel>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UserStats {
    pub user: UserModel,
    pub rank: Option<i64>,
    pub multiplier: f64,
    pub checked_in_today: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub wallet_address: String,
    pub best_streak: i32,
    pub current_streak: i32,
    pub points_earned: i64,
    pub tokens_claimed: i64,
    pub nft_count: i32,
    pub last_active: Option<DateTime<Utc>>,
}

impl LeaderboardEntry {
    pub fn new(row: &QueryResult) -> std::result::Result<LeaderboardEntry, sea_orm::DbErr> {
        Ok(LeaderboardEntry {
            rank: row.try_get("", "rank")?,
            wallet_address: row.try_get("", "wallet_address")?,
            best_streak: row.try_get("", "best_streak")?,
            current_streak: row.try_get("", "current_streak")?,
            points_earned: row.try_get("", "points_earned")?,
            tokens_claimed: row.try_get("", "tokens_claimed")?,
            nft_count: row.try_get("", "nft_count")?,
            last_active: row.try_get("", "last_active")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Leaderboard {
    pub total_pages: i64,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NftUsageRequest {
    pub token_id: Option<Value>,
    pub contract_address: Option<String>,
}

/// Accepts a token id sent as a JSON number or a numeric string.
pub fn token_id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .filter(|token_id| *token_id >= 0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NftUsageStatus {
    #[serde(rename = "isUsed")]
    pub is_used: bool,
    pub usage: Vec<NftUsageModel>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct WalletNfts {
    pub count: usize,
    pub nfts: Vec<NftModel>,
    #[serde(rename = "totalBonusPoints")]
    pub total_bonus_points: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NftPointsPreview {
    pub base_points: i64,
    pub multiplier: f64,
    pub projected_points: i64,
    pub eligible_nfts: Vec<NftModel>,
    pub locked_nfts: Vec<NftModel>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RefreshRequest {
    pub wallet_address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct EvolutionRequest {
    #[serde(rename = "walletAddress")]
    pub wallet_address: Option<String>,
    #[serde(rename = "primoTokenId")]
    pub primo_token_id: Option<Value>,
    #[serde(rename = "stoneType")]
    pub stone_type: Option<String>,
    #[serde(rename = "stoneTokenId")]
    pub stone_token_id: Option<Value>,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StoneBalance {
    #[serde(rename = "type")]
    pub stone_type: StoneType,
    pub name: &'static str,
    #[serde(rename = "tokenId")]
    pub token_id: i64,
    pub balance: u64,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "compatibleWith")]
    pub compatible_with: &'static [&'static str],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PrimoDetails {
    #[serde(rename = "tokenId")]
    pub token_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub rarity: String,
    #[serde(rename = "isShiny")]
    pub is_shiny: bool,
    #[serde(rename = "isFullSet")]
    pub is_full_set: bool,
    #[serde(rename = "bonusPoints")]
    pub bonus_points: i32,
    #[serde(rename = "compatibleStones")]
    pub compatible_stones: Vec<StoneType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::serde::json::json;

    #[test]
    fn envelope_status_follows_code() {
        let (status, body) =
            ResponseData::<()>::new(RESPONSE_BAD_REQUEST, "nope".to_owned(), None).into_response();
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body.code, Some(400));

        let (status, body) = respond::<u8>(Ok(7), "test");
        assert_eq!(status, Status::Ok);
        assert_eq!(body.data, Some(7));
    }

    #[test]
    fn errors_become_envelopes() {
        let (status, body) = respond::<u8>(Err(ApiError::AlreadyCheckedIn), "test");
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body.message, "Already checked in today (UTC)");
        assert!(body.data.is_none());

        let (status, _) = respond::<u8>(
            Err(ApiError::Database(sea_orm::DbErr::Custom("boom".to_owned()))),
            "test",
        );
        assert_eq!(status, Status::InternalServerError);
    }

    #[test]
    fn envelope_uses_camel_case_status_code() {
        let body = rocket::serde::json::to_value(ResponseData::new(200, String::new(), Some(1)))
            .unwrap();
        assert_eq!(
            body,
            json!({ "code": 200, "statusCode": null, "message": "", "data": 1 })
        );
    }

    #[test]
    fn token_ids_accept_numbers_and_numeric_strings() {
        assert_eq!(token_id_from_value(&json!(1903)), Some(1903));
        assert_eq!(token_id_from_value(&json!("1903")), Some(1903));
        assert_eq!(token_id_from_value(&json!("19x")), None);
        assert_eq!(token_id_from_value(&json!(-1)), None);
        assert_eq!(token_id_from_value(&json!(1.5)), None);
        assert_eq!(token_id_from_value(&json!(null)), None);
    }
}
