use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use sea_orm_migration::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct MigrationConfig {
    database_url: Option<String>,
}

#[tokio::main]
async fn main() {
    // the migrator CLI reads DATABASE_URL; fall back to App.toml
    if std::env::var("DATABASE_URL").is_err() {
        let config: MigrationConfig = Figment::new()
            .merge(Toml::file("App.toml"))
            .merge(Env::prefixed("PRIMOS_"))
            .extract()
            .expect("Invalid migration config");
        if let Some(database_url) = config.database_url {
            std::env::set_var("DATABASE_URL", database_url);
        }
    }

    cli::run_cli(primos_db_migration::Migrator).await;
}
