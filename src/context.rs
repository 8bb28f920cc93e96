use std::sync::Arc;

use redis::Client;
use sqlx::{Pool, Postgres};

use crate::config::RunConfiguration;
use crate::utils::badge_utils::BadgeRegistry;

pub struct Context {
    pub pool: Arc<Pool<Postgres>>,
    pub config: Arc<RunConfiguration>,
    pub redis: Arc<Client>,
    pub badges: Arc<BadgeRegistry>,
}
