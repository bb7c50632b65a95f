mod chain;
mod check_in_service;
mod cors;
mod dto;
mod error;
mod evolution_service;
mod leaderboard_service;
mod maintenance;
mod metadata;
mod nft_service;
mod points;
mod pool;
mod request_timer;
mod routes;
mod sql_stmt;
mod stones;
mod streak;
mod wallet;

use chain::{RoninChain, SharedChain};
use dto::{
    ApiResponse, ResponseData, RESPONSE_BAD_REQUEST, RESPONSE_INTERNAL_ERROR, RESPONSE_MAINTENANCE,
    RESPONSE_UNAUTHORIZED,
};
use metadata::MetadataFetcher;
use pool::Db;
use rocket::{Config, Request};
use sea_orm_rocket::Database;
use std::sync::Arc;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[macro_use]
extern crate rocket;

#[get("/")]
async fn health_ping() -> &'static str {
    ""
}

#[get("/maintenance_mode")]
async fn maintenance_mode() -> ApiResponse<&'static str> {
    ResponseData::new(
        RESPONSE_MAINTENANCE,
        "Service under maintenance".to_owned(),
        None,
    )
    .into_response()
}

#[catch(400)]
async fn malformed_request() -> ApiResponse<String> {
    ResponseData::new(
        RESPONSE_BAD_REQUEST,
        "Malformed request body".to_owned(),
        None,
    )
    .into_response()
}

#[catch(401)]
async fn unauthorized() -> ApiResponse<String> {
    ResponseData::new(
        RESPONSE_UNAUTHORIZED,
        "Authorization required".to_owned(),
        None,
    )
    .into_response()
}

#[catch(404)]
async fn bad_request(req: &Request<'_>) -> ApiResponse<String> {
    let message = format!("Couldn't find '{}'", req.uri());
    ResponseData::new(RESPONSE_BAD_REQUEST, message, None).into_response()
}

#[catch(422)]
async fn unprocessable(req: &Request<'_>) -> ApiResponse<String> {
    let message = format!("Please check the JSON body sent to '{}'", req.uri().path());
    ResponseData::new(RESPONSE_BAD_REQUEST, message, None).into_response()
}

#[catch(500)]
async fn internal_error() -> ApiResponse<String> {
    ResponseData::new(
        RESPONSE_INTERNAL_ERROR,
        "Whoops! Looks like we messed up.".to_owned(),
        None,
    )
    .into_response()
}

#[launch]
async fn rocket() -> _ {
    let loyalty_config = Config::figment()
        .extract::<pool::LoyaltyConfig>()
        .expect("Invalid loyalty config");
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &loyalty_config.rust_log);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("primos_web_api={}", &loyalty_config.web_api_log)
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let reqwest_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .expect("Reqwest client failed to initialize!");
    let fetcher = MetadataFetcher::new(
        reqwest_client,
        &loyalty_config.ipfs_gateway,
        loyalty_config.retry_policy(),
    );

    let chain: SharedChain = Arc::new(
        RoninChain::new(
            &loyalty_config.ronin_rpc_url,
            &loyalty_config.primos_contract_address,
            &loyalty_config.stones_contract_address,
        )
        .expect("Ronin provider failed to initialize!"),
    );

    let allowed_domains = loyalty_config.allowed_domains();
    let enable_request_timer = loyalty_config.enable_request_timer;

    let rocket = rocket::build()
        .register(
            "/",
            catchers![
                malformed_request,
                unauthorized,
                bad_request,
                unprocessable,
                internal_error
            ],
        )
        .attach(Db::init())
        .attach(maintenance::MaintenanceMode)
        .manage(loyalty_config)
        .manage(fetcher)
        .manage(chain)
        .attach(cors::OriginHeader { allowed_domains })
        .attach(routes::mount())
        .mount("/", routes![health_ping, maintenance_mode]);

    if enable_request_timer {
        rocket.attach(request_timer::RequestTimer)
    } else {
        rocket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;
    use rocket::local::blocking::Client;
    use rocket::serde::json::Value;

    fn client() -> Client {
        let rocket = rocket::build()
            .register(
                "/",
                catchers![malformed_request, unauthorized, bad_request, internal_error],
            )
            .mount("/", routes![health_ping, maintenance_mode]);
        Client::tracked(rocket).unwrap()
    }

    #[test]
    fn unknown_route_status_matches_envelope_code() {
        let client = client();
        let response = client.get("/api/nothing-here").dispatch();
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["code"], 400);
    }

    #[test]
    fn maintenance_route_answers_503() {
        let client = client();
        let response = client.get("/maintenance_mode").dispatch();
        assert_eq!(response.status(), Status::ServiceUnavailable);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["code"], 503);
    }
}
