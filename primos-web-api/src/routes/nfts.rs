use crate::chain::SharedChain;
use crate::dto::{
    respond, token_id_from_value, ApiResponse, NftPointsPreview, NftUsageRequest,
    NftUsageStatus, RefreshRequest, ResponseData, WalletNfts, RESPONSE_OK,
};
use crate::error::ApiError;
use crate::metadata::MetadataFetcher;
use crate::pool::{Db, LoyaltyConfig};
use crate::{nft_service, wallet};
use chrono::Utc;
use rocket::{serde::json::Json, State};
use sea_orm_rocket::Connection;
use tracing::info;

#[get("/nft-check?<wallet_address>")]
pub async fn get_wallet_nfts(
    conn: Connection<'_, Db>,
    wallet_address: Option<String>,
) -> ApiResponse<WalletNfts> {
    let db = conn.into_inner();
    let result = async {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        nft_service::wallet_nfts(db, &wallet_address).await
    }
    .await;
    respond(result, "Error fetching NFTs")
}

#[post("/nft-check", format = "json", data = "<request>")]
pub async fn check_nft_usage(
    conn: Connection<'_, Db>,
    request: Json<NftUsageRequest>,
) -> ApiResponse<NftUsageStatus> {
    let db = conn.into_inner();
    let NftUsageRequest {
        token_id,
        contract_address,
    } = request.into_inner();
    let result = async {
        let required =
            || ApiError::BadRequest("token_id and contract_address are required".to_owned());
        let token_id = token_id.as_ref().ok_or_else(required)?;
        let token_id = token_id_from_value(token_id)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid token_id: {}", token_id)))?;
        let contract_address = contract_address
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(required)?;
        nft_service::usage_status(db, token_id, contract_address.trim(), Utc::now().date_naive())
            .await
    }
    .await;

    match result {
        Ok(status) => {
            let message = if status.is_used {
                "NFT already used today, available again at 00:00 UTC"
            } else {
                "NFT available today"
            };
            ResponseData::new(RESPONSE_OK, message.to_owned(), Some(status)).into_response()
        }
        Err(error) => respond(Err(error), "Error checking NFT usage"),
    }
}

#[get("/nft-points?<wallet_address>")]
pub async fn get_points_preview(
    conn: Connection<'_, Db>,
    wallet_address: Option<String>,
) -> ApiResponse<NftPointsPreview> {
    let db = conn.into_inner();
    let result = async {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        nft_service::points_preview(db, &wallet_address, Utc::now()).await
    }
    .await;
    respond(result, "Error calculating NFT points")
}

#[post("/nfts/refresh", format = "json", data = "<request>")]
pub async fn refresh_nfts(
    conn: Connection<'_, Db>,
    config: &State<LoyaltyConfig>,
    chain: &State<SharedChain>,
    fetcher: &State<MetadataFetcher>,
    request: Json<RefreshRequest>,
) -> ApiResponse<WalletNfts> {
    let db = conn.into_inner();
    let RefreshRequest { wallet_address } = request.into_inner();
    let result = async {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        info!("Refreshing NFTs of {}", wallet_address);
        nft_service::refresh_wallet(
            db,
            chain.inner().as_ref(),
            fetcher,
            &config.primos_contract(),
            &wallet_address,
            Utc::now(),
        )
        .await
    }
    .await;
    respond(result, "Error refreshing NFTs")
}
