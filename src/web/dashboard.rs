use std::sync::Arc;

use axum::{
    response::{IntoResponse, Redirect},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::{
    context::Context,
    utils::{user_utils, ProfileServerError, SiteStats},
    web::current_username,
};

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub username: String,
    pub bio: String,
    pub avatar: String,
    pub github: String,
    pub discord: String,
    pub badges: Vec<String>,
    pub profile_views: i32,
    pub stats: SiteStats,
}

//Aggregates are recomputed on every request; at this scale three extra
//queries per page load are fine.
pub async fn dashboard(
    Extension(ctx): Extension<Arc<Context>>,
    jar: CookieJar,
) -> Result<axum::response::Response, ProfileServerError> {
    let username = match current_username(&ctx, &jar).await? {
        None => return Ok(Redirect::to("/login").into_response()),
        Some(username) => username,
    };

    let user = user_utils::get_user(&ctx.pool, &username)
        .await?
        .ok_or(ProfileServerError::UserNotFound)?;

    let total_accounts = user_utils::count_accounts(&ctx.pool).await?;
    let total_views = user_utils::total_profile_views(&ctx.pool).await?;
    let recent_accounts = user_utils::recent_accounts(&ctx.pool).await?;

    Ok(Json(DashboardView {
        badges: user.badge_names(),
        username: user.username,
        bio: user.bio,
        avatar: user.avatar,
        github: user.github,
        discord: user.discord,
        profile_views: user.profile_views,
        stats: SiteStats {
            total_accounts,
            total_views,
            recent_accounts,
        },
    })
    .into_response())
}

pub fn router() -> Router {
    Router::new().route("/dashboard", get(dashboard))
}
