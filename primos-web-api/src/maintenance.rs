use crate::pool::LoyaltyConfig;
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{uri::Origin, Method},
    Data, Request, State,
};
use tracing::{info, warn};

const MAINTENANCE_URI: &str = "/maintenance_mode";

pub struct MaintenanceMode;

#[rocket::async_trait]
impl Fairing for MaintenanceMode {
    fn info(&self) -> Info {
        Info {
            name: "Maintenance Mode",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let enabled = match request.guard::<&State<LoyaltyConfig>>().await.succeeded() {
            Some(config) => config.enable_maintenance,
            None => {
                warn!("Loyalty config is not managed; maintenance mode off");
                false
            }
        };
        // the health ping stays reachable
        if !enabled || request.uri().path().as_str() == "/" {
            return;
        }
        if let Ok(uri) = Origin::parse(MAINTENANCE_URI) {
            request.set_uri(uri);
            request.set_method(Method::Get);
            info!("URI: {}", request.uri());
        }
    }
}
