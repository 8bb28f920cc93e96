use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use config::RunConfiguration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::ConnectOptions;
use tracing::{error, info, Level};

use crate::context::Context;
use crate::utils::badge_utils::BadgeRegistry;
use crate::utils::upload_utils::ensure_upload_dirs;
use crate::utils::user_utils::promote_owners;
use crate::web::serve as serve_web;

mod config;
mod context;
mod db;
mod utils;
mod web;

async fn health_check() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::FmtSubscriber::builder()
        .with_thread_names(true)
        .with_target(false)
        .with_max_level(
            Level::from_str(env::var("LOG_LEVEL").unwrap_or("INFO".to_string()).as_str())
                .unwrap_or(Level::DEBUG),
        )
        .compact()
        .init();

    dotenvy::dotenv().ok();

    let run_configuration = RunConfiguration::parse();

    let connection_options = PgConnectOptions::from_str(&run_configuration.database_dsn)
        .unwrap()
        .log_statements(tracing::log::LevelFilter::Debug)
        .log_slow_statements(
            tracing::log::LevelFilter::Warn,
            std::time::Duration::from_secs(1),
        );
    let pool = PgPoolOptions::new().connect_with(connection_options).await;

    if let Err(error) = pool {
        error!("Failed to connect to db: {:#?}", error);
        return;
    }

    info!(name: "db", "Connected to database!");

    let pool = pool.unwrap();

    if let Err(error) = db::init_schema(&pool).await {
        error!("Failed to initialize schema: {:#?}", error);
        return;
    }

    if let Err(error) = promote_owners(&pool, &run_configuration.owner_usernames).await {
        error!("Failed to promote owner accounts: {:#?}", error);
        return;
    }

    if let Err(error) = ensure_upload_dirs(&run_configuration.data_dir) {
        error!("Failed to create upload directories: {}", error);
        return;
    }

    let badges = BadgeRegistry::load(&Path::new(&run_configuration.data_dir).join("badges"));
    if let Err(error) = badges {
        error!("Failed to load badge registry: {:?}", error);
        return;
    }

    let redis = redis::Client::open(run_configuration.clone().redis_url);
    if let Err(error) = redis {
        error!("Error while connecting to redis: {}", error);
        return;
    }

    let redis = redis.unwrap();
    let context = Context {
        pool: Arc::new(pool),
        config: Arc::new(run_configuration),
        redis: Arc::new(redis),
        badges: Arc::new(badges.unwrap()),
    };

    serve_web(context).await;
}
