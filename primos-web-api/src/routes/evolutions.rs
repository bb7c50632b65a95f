use crate::chain::SharedChain;
use crate::dto::{
    respond, ApiResponse, AuthToken, EvolutionRequest, PrimoDetails, ResponseData, StoneBalance,
    RESPONSE_OK,
};
use crate::metadata::MetadataFetcher;
use crate::pool::{Db, LoyaltyConfig};
use crate::routes::web3_auth;
use crate::{evolution_service, wallet};
use chrono::Utc;
use primos_db_entity::db::evolutions::Model as EvolutionModel;
use rocket::{serde::json::Json, State};
use sea_orm_rocket::Connection;

#[get("/evolutions?<wallet_address>")]
pub async fn get_evolutions(
    conn: Connection<'_, Db>,
    wallet_address: Option<String>,
) -> ApiResponse<Vec<EvolutionModel>> {
    let db = conn.into_inner();
    let result = async {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        evolution_service::list(db, &wallet_address).await
    }
    .await;
    respond(result, "Error fetching evolutions")
}

#[post("/evolutions", format = "json", data = "<request>")]
pub async fn start_evolution(
    conn: Connection<'_, Db>,
    config: &State<LoyaltyConfig>,
    auth: Option<AuthToken<'_>>,
    request: Json<EvolutionRequest>,
) -> ApiResponse<EvolutionModel> {
    let db = conn.into_inner();
    let result = async {
        let evolution = evolution_service::validate(request.into_inner())?;
        web3_auth::authorize(config, auth.as_ref(), &evolution.wallet_address)?;
        evolution_service::create(db, evolution, Utc::now()).await
    }
    .await;

    match result {
        Ok(evolution) => ResponseData::new(
            RESPONSE_OK,
            "Evolution process started successfully".to_owned(),
            Some(evolution),
        )
        .into_response(),
        Err(error) => respond(Err(error), "Error starting evolution"),
    }
}

#[get("/evolution/stones?<wallet_address>")]
pub async fn get_stones(
    chain: &State<SharedChain>,
    fetcher: &State<MetadataFetcher>,
    wallet_address: Option<String>,
) -> ApiResponse<Vec<StoneBalance>> {
    let result = async {
        let owner = wallet::parse_address(&wallet_address.unwrap_or_default())?;
        evolution_service::stone_balances(chain.inner().as_ref(), fetcher, owner).await
    }
    .await;
    respond(result, "Error fetching stones")
}

#[get("/evolution/primos?<wallet_address>")]
pub async fn get_primos(
    chain: &State<SharedChain>,
    fetcher: &State<MetadataFetcher>,
    wallet_address: Option<String>,
) -> ApiResponse<Vec<PrimoDetails>> {
    let result = async {
        let owner = wallet::parse_address(&wallet_address.unwrap_or_default())?;
        evolution_service::wallet_primos(chain.inner().as_ref(), fetcher, owner).await
    }
    .await;
    respond(result, "Error fetching Primos")
}
