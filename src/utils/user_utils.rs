use lazy_static::lazy_static;
use regex::Regex;
use sqlx::{Pool, Postgres, Row};
use tracing::{error, info};

use crate::db::user::User;

use super::{AccountSummary, ProfileServerError, RecentAccount};

lazy_static! {
    static ref USERNAME_FORMAT: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

//Usernames become a path segment (/:username) and an upload path prefix, so
//only characters safe in both are accepted.
pub fn valid_username(username: &str) -> bool {
    USERNAME_FORMAT.is_match(username)
}

pub fn is_bootstrap_owner(owners: &[String], username: &str) -> bool {
    owners
        .iter()
        .any(|owner| !owner.is_empty() && owner == username)
}

pub async fn get_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<User>, ProfileServerError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username=$1")
        .bind(username)
        .fetch_optional(pool)
        .await;

    match user {
        Err(error) => {
            error!("Failed to fetch user: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(user) => Ok(user),
    }
}

//Duplicate detection relies on the unique index, not a pre-check, so two
//concurrent signups for the same name can never both succeed.
pub async fn create_user(
    pool: &Pool<Postgres>,
    username: &str,
    password_hash: &str,
) -> Result<(), ProfileServerError> {
    let result = sqlx::query("INSERT INTO users(username, password) VALUES($1, $2)")
        .bind(username)
        .bind(password_hash)
        .execute(pool)
        .await;

    match result {
        Ok(_) => {
            info!("Created account: {}", username);
            Ok(())
        }
        Err(error) => {
            if let Some(db_error) = error.as_database_error() {
                if db_error.code().as_deref() == Some("23505") {
                    return Err(ProfileServerError::DuplicateUsername);
                }
            }

            error!("Failed to insert user: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
    }
}

//Every mutable profile column is rewritten on each submission; there are no
//partial updates.
pub struct ProfileUpdate {
    pub bio: String,
    pub avatar: String,
    pub background: String,
    pub github: String,
    pub discord: String,
    pub show_discord: i32,
    pub show_github: i32,
    pub discord_server: String,
    pub text_glow: i32,
    pub text_color: String,
    pub custom_font: String,
    pub music_url: String,
}

pub async fn update_profile(
    pool: &Pool<Postgres>,
    username: &str,
    update: &ProfileUpdate,
) -> Result<(), ProfileServerError> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            bio=$1, avatar=$2, background=$3, github=$4, discord=$5,
            show_discord=$6, show_github=$7, discord_server=$8,
            text_glow=$9, text_color=$10, custom_font=$11, music_url=$12
        WHERE username=$13
        "#,
    )
    .bind(&update.bio)
    .bind(&update.avatar)
    .bind(&update.background)
    .bind(&update.github)
    .bind(&update.discord)
    .bind(update.show_discord)
    .bind(update.show_github)
    .bind(&update.discord_server)
    .bind(update.text_glow)
    .bind(&update.text_color)
    .bind(&update.custom_font)
    .bind(&update.music_url)
    .bind(username)
    .execute(pool)
    .await;

    if let Err(error) = result {
        error!("Failed to update profile: {:#?}", error);
        return Err(ProfileServerError::Internal(error.to_string()));
    }

    Ok(())
}

//Single atomic statement; never read-then-write, concurrent views can only
//skip via the session flag, not lose increments at the store.
pub async fn increment_profile_views(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<(), ProfileServerError> {
    let result =
        sqlx::query("UPDATE users SET profile_views = profile_views + 1 WHERE username=$1")
            .bind(username)
            .execute(pool)
            .await;

    if let Err(error) = result {
        error!("Failed to increment profile views: {:#?}", error);
        return Err(ProfileServerError::Internal(error.to_string()));
    }

    Ok(())
}

//Full replace of the badge set, and the admin flag is always written with it.
pub async fn set_badges_and_admin(
    pool: &Pool<Postgres>,
    username: &str,
    badges: &str,
    is_admin: i32,
) -> Result<(), ProfileServerError> {
    let result = sqlx::query("UPDATE users SET badges=$1, is_admin=$2 WHERE username=$3")
        .bind(badges)
        .bind(is_admin)
        .bind(username)
        .execute(pool)
        .await;

    match result {
        Err(error) => {
            error!("Failed to update badges: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(result) => {
            if result.rows_affected() == 0 {
                return Err(ProfileServerError::UserNotFound);
            }

            Ok(())
        }
    }
}

pub async fn count_accounts(pool: &Pool<Postgres>) -> Result<i64, ProfileServerError> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
        .fetch_one(pool)
        .await;

    match row {
        Err(error) => {
            error!("Failed to count accounts: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(row) => Ok(row.get("count")),
    }
}

pub async fn total_profile_views(pool: &Pool<Postgres>) -> Result<i64, ProfileServerError> {
    let row = sqlx::query("SELECT COALESCE(SUM(profile_views), 0) AS total FROM users")
        .fetch_one(pool)
        .await;

    match row {
        Err(error) => {
            error!("Failed to sum profile views: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(row) => Ok(row.get("total")),
    }
}

pub async fn recent_accounts(
    pool: &Pool<Postgres>,
) -> Result<Vec<RecentAccount>, ProfileServerError> {
    let rows = sqlx::query_as::<_, RecentAccount>(
        "SELECT username, created_at FROM users ORDER BY id DESC LIMIT 5",
    )
    .fetch_all(pool)
    .await;

    match rows {
        Err(error) => {
            error!("Failed to fetch recent accounts: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(rows) => Ok(rows),
    }
}

pub async fn list_accounts(
    pool: &Pool<Postgres>,
) -> Result<Vec<AccountSummary>, ProfileServerError> {
    let rows = sqlx::query_as::<_, AccountSummary>(
        "SELECT username, badges, is_admin FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await;

    match rows {
        Err(error) => {
            error!("Failed to list accounts: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(rows) => Ok(rows),
    }
}

//The owner list from config only seeds the stored flag; the admin panel
//itself gates on is_admin alone.
pub async fn promote_owners(
    pool: &Pool<Postgres>,
    owners: &[String],
) -> Result<(), ProfileServerError> {
    let owners: Vec<&String> = owners.iter().filter(|name| !name.is_empty()).collect();
    if owners.is_empty() {
        return Ok(());
    }

    let result = sqlx::query("UPDATE users SET is_admin=1 WHERE username = ANY($1)")
        .bind(
            owners
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<String>>(),
        )
        .execute(pool)
        .await;

    match result {
        Err(error) => {
            error!("Failed to promote owners: {:#?}", error);
            Err(ProfileServerError::Internal(error.to_string()))
        }
        Ok(result) => {
            if result.rows_affected() > 0 {
                info!("Promoted {} owner account(s) to admin", result.rows_affected());
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_restricted_to_path_safe_characters() {
        assert!(valid_username("alice"));
        assert!(valid_username("Alice_2-b"));

        assert!(!valid_username("../../../x"));
        assert!(!valid_username("a/b"));
        assert!(!valid_username("a b"));
        assert!(!valid_username("a.b"));
        assert!(!valid_username(""));
    }

    #[test]
    fn owner_membership_is_exact_and_skips_empty_entries() {
        let owners = vec!["zni".to_string(), "".to_string(), "waiser".to_string()];

        assert!(is_bootstrap_owner(&owners, "zni"));
        assert!(is_bootstrap_owner(&owners, "waiser"));
        assert!(!is_bootstrap_owner(&owners, "Zni"));
        assert!(!is_bootstrap_owner(&owners, ""));
        assert!(!is_bootstrap_owner(&[], "zni"));
    }
}
