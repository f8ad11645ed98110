mod config;
mod error;
mod models;
mod schema;

use crate::config::Config;
use tracing::error;

#[tokio::main]
pub async fn main() {
    tracing_subscriber::fmt().init();
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    models::create_database(&config).await;
    models::create_tables(&config).await;
}
