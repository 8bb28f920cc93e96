use clap::{arg, clap_derive::Parser};

#[derive(Parser, Debug, Clone)]
pub struct RunConfiguration {
    #[arg(long, env)]
    pub database_dsn: String,
    #[arg(long, env)]
    pub redis_url: String,
    #[arg(long, env)]
    pub port: Option<i16>,
    #[arg(long, env, default_value = "data")]
    pub data_dir: String,
    //Bootstrap only: these accounts get is_admin set at startup.
    #[arg(long, env, value_delimiter = ',', default_value = "")]
    pub owner_usernames: Vec<String>,
    #[arg(long, env, default_value = "https://discord.com/api/v10")]
    pub discord_api_url: String,
    #[arg(long, env, default_value_t = 604800)]
    pub session_ttl_seconds: u64,
}
