use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::prelude::FromRow;

pub mod badge_utils;
pub mod discord_utils;
pub mod session_utils;
pub mod upload_utils;
pub mod user_utils;

#[derive(Debug, Clone)]
pub enum ProfileServerError {
    DuplicateUsername,
    InvalidCredentials,
    UserNotFound,
    AccessDenied,
    Internal(String),
}

//Plain text bodies on purpose; there is no structured error contract
//towards the client.
impl IntoResponse for ProfileServerError {
    fn into_response(self) -> Response {
        match self {
            ProfileServerError::DuplicateUsername => {
                (StatusCode::CONFLICT, "Username already taken").into_response()
            }
            ProfileServerError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid login").into_response()
            }
            ProfileServerError::UserNotFound => {
                (StatusCode::NOT_FOUND, "User not found").into_response()
            }
            ProfileServerError::AccessDenied => {
                (StatusCode::FORBIDDEN, "Access denied").into_response()
            }
            ProfileServerError::Internal(error) => {
                tracing::error!("Internal error: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[derive(FromRow, Debug, Serialize)]
pub struct RecentAccount {
    pub username: String,
    pub created_at: NaiveDateTime,
}

#[derive(FromRow, Debug, Serialize)]
pub struct AccountSummary {
    pub username: String,
    pub badges: String,
    pub is_admin: i32,
}

#[derive(Debug, Serialize)]
pub struct SiteStats {
    pub total_accounts: i64,
    pub total_views: i64,
    pub recent_accounts: Vec<RecentAccount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::to_bytes;

    async fn status_and_body(error: ProfileServerError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn duplicate_username_maps_to_conflict() {
        let (status, body) = status_and_body(ProfileServerError::DuplicateUsername).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "Username already taken");
    }

    #[tokio::test]
    async fn invalid_credentials_map_to_unauthorized() {
        let (status, body) = status_and_body(ProfileServerError::InvalidCredentials).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Invalid login");
    }

    #[tokio::test]
    async fn unknown_user_maps_to_not_found() {
        let (status, body) = status_and_body(ProfileServerError::UserNotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "User not found");
    }

    #[tokio::test]
    async fn access_denied_maps_to_forbidden_with_no_panel_data() {
        let (status, body) = status_and_body(ProfileServerError::AccessDenied).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Access denied");
    }

    //Internal details stay in the server log; the client sees a generic body.
    #[tokio::test]
    async fn internal_errors_never_leak_details() {
        let (status, body) =
            status_and_body(ProfileServerError::Internal("dsn=secret".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
        assert!(!body.contains("secret"));
    }
}
