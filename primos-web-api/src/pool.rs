use async_trait::async_trait;
use rocket::serde::Deserialize;
use rocket::Config;
use sea_orm::ConnectOptions;
use sea_orm_rocket::{rocket::figment::Figment, Database};
use std::time::Duration;

#[derive(Database, Debug)]
#[database("sea_orm")]
pub struct Db(SeaOrmPool);

#[derive(Debug)]
pub struct SeaOrmPool {
    pub conn: sea_orm::DatabaseConnection,
}

#[async_trait]
impl sea_orm_rocket::Pool for SeaOrmPool {
    type Error = sea_orm::DbErr;

    type Connection = sea_orm::DatabaseConnection;

    async fn init(_figment: &Figment) -> Result<Self, Self::Error> {
        let config = Config::figment()
            .extract::<LoyaltyConfig>()
            .map_err(|error| sea_orm::DbErr::Custom(format!("Invalid config: {}", error)))?;
        let conn = sea_orm::Database::connect(config.connect_options()).await?;

        Ok(SeaOrmPool { conn })
    }

    fn borrow(&self) -> &Self::Connection {
        &self.conn
    }
}

#[derive(Deserialize, Clone)]
#[serde(crate = "rocket::serde")]
pub struct LoyaltyConfig {
    database_url: String,
    sqlx_max_connections: u32,
    sqlx_min_connections: Option<u32>,
    sqlx_connect_timeout: Option<u64>,
    sqlx_idle_timeout: Option<u64>,
    sqlx_max_lifetime: Option<u64>,
    sqlx_logging: Option<bool>,
    web_api_sqlx_logging_level: String,
    pub rust_log: String,
    pub web_api_log: String,
    pub cors_allowed_domains: String,
    pub jwt_key: String,
    #[serde(default)]
    pub enforce_wallet_auth: bool,
    pub enable_maintenance: bool,
    #[serde(default)]
    pub enable_request_timer: bool,
    pub ronin_rpc_url: String,
    pub primos_contract_address: String,
    pub stones_contract_address: String,
    pub ipfs_gateway: String,
    pub metadata_retry_attempts: Option<u32>,
    pub metadata_retry_delay_millis: Option<u64>,
}

impl LoyaltyConfig {
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options: ConnectOptions = self.database_url.to_owned().into();
        options
            .max_connections(self.sqlx_max_connections)
            .min_connections(self.sqlx_min_connections.unwrap_or(2))
            .connect_timeout(Duration::from_secs(self.sqlx_connect_timeout.unwrap_or(8)))
            .idle_timeout(Duration::from_secs(self.sqlx_idle_timeout.unwrap_or(8)))
            .max_lifetime(Duration::from_secs(self.sqlx_max_lifetime.unwrap_or(8)))
            .sqlx_logging(self.sqlx_logging.unwrap_or(false))
            .sqlx_logging_level(
                match self.web_api_sqlx_logging_level.parse::<log::LevelFilter>() {
                    Ok(level) => level,
                    Err(_) => log::LevelFilter::Info,
                },
            );
        options
    }

    /// Primos ERC-721 contract, lowercase.
    pub fn primos_contract(&self) -> String {
        self.primos_contract_address.to_lowercase()
    }

    pub fn retry_policy(&self) -> crate::metadata::RetryPolicy {
        crate::metadata::RetryPolicy {
            attempts: self.metadata_retry_attempts.unwrap_or(3),
            initial_delay: Duration::from_millis(self.metadata_retry_delay_millis.unwrap_or(1_000)),
            backoff_factor: 2,
        }
    }

    pub fn allowed_domains(&self) -> std::collections::HashSet<String> {
        self.cors_allowed_domains
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
