use redis::AsyncCommands;
use tracing::error;
use uuid::Uuid;

use super::ProfileServerError;

pub const SESSION_COOKIE: &str = "glim_session";

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

fn viewed_key(token: &str, username: &str) -> String {
    format!("session:{}:viewed:{}", token, username)
}

async fn connection(
    redis: &redis::Client,
) -> Result<redis::aio::MultiplexedConnection, ProfileServerError> {
    match redis.get_multiplexed_async_connection().await {
        Err(error) => {
            error!("Failed to get redis connection: {}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(connection) => Ok(connection),
    }
}

pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

//Binds a token to a username; anonymous tokens (view tracking only) never
//get this key and stay unauthenticated.
pub async fn create_session(
    redis: &redis::Client,
    token: &str,
    username: &str,
    ttl_seconds: u64,
) -> Result<(), ProfileServerError> {
    let mut connection = connection(redis).await?;

    let result: Result<(), redis::RedisError> = connection
        .set_ex(session_key(token), username, ttl_seconds)
        .await;

    if let Err(error) = result {
        error!("Failed to store session: {}", error);
        return Err(ProfileServerError::Internal(error.to_string()));
    }

    Ok(())
}

pub async fn session_username(
    redis: &redis::Client,
    token: &str,
) -> Result<Option<String>, ProfileServerError> {
    let mut connection = connection(redis).await?;

    let username: Result<Option<String>, redis::RedisError> =
        connection.get(session_key(token)).await;

    match username {
        Err(error) => {
            error!("Failed to read session: {}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(username) => Ok(username),
    }
}

pub async fn destroy_session(
    redis: &redis::Client,
    token: &str,
) -> Result<(), ProfileServerError> {
    let mut connection = connection(redis).await?;

    let result: Result<(), redis::RedisError> = connection.del(session_key(token)).await;

    if let Err(error) = result {
        error!("Failed to destroy session: {}", error);
        return Err(ProfileServerError::Internal(error.to_string()));
    }

    Ok(())
}

pub async fn has_viewed(
    redis: &redis::Client,
    token: &str,
    username: &str,
) -> Result<bool, ProfileServerError> {
    let mut connection = connection(redis).await?;

    let viewed: Result<bool, redis::RedisError> =
        connection.exists(viewed_key(token, username)).await;

    match viewed {
        Err(error) => {
            error!("Failed to read viewed flag: {}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(viewed) => Ok(viewed),
    }
}

//The flag shares the session's lifetime, so a browser session counts a
//given profile at most once.
pub async fn mark_viewed(
    redis: &redis::Client,
    token: &str,
    username: &str,
    ttl_seconds: u64,
) -> Result<(), ProfileServerError> {
    let mut connection = connection(redis).await?;

    let result: Result<(), redis::RedisError> = connection
        .set_ex(viewed_key(token, username), 1, ttl_seconds)
        .await;

    if let Err(error) = result {
        error!("Failed to mark profile as viewed: {}", error);
        return Err(ProfileServerError::Internal(error.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique() {
        assert_ne!(new_session_token(), new_session_token());
    }

    #[test]
    fn viewed_keys_are_scoped_per_session_and_target() {
        assert_eq!(viewed_key("t1", "alice"), "session:t1:viewed:alice");
        assert_ne!(viewed_key("t1", "alice"), viewed_key("t2", "alice"));
        assert_ne!(viewed_key("t1", "alice"), viewed_key("t1", "bob"));
    }
}
