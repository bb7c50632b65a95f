use rocket::fairing::AdHoc;
use rocket::http::Status;

pub mod check_in;
pub mod evolutions;
pub mod history;
pub mod leaderboard;
pub mod nfts;
pub mod user;
pub mod web3_auth;

/// CORS preflight; the origin headers are added by the CORS fairing.
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}

pub fn mount() -> AdHoc {
    AdHoc::on_ignite("Attaching Routes", |rocket| async {
        rocket
            .mount(
                "/api",
                routes![
                    check_in::check_in,
                    history::get_check_in_history,
                    user::get_user,
                    leaderboard::get,
                    nfts::get_wallet_nfts,
                    nfts::check_nft_usage,
                    nfts::get_points_preview,
                    nfts::refresh_nfts,
                    evolutions::get_evolutions,
                    evolutions::start_evolution,
                    evolutions::get_stones,
                    evolutions::get_primos,
                    web3_auth::login,
                    web3_auth::verify
                ],
            )
            .mount("/", routes![preflight])
    })
}
