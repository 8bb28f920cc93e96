use std::sync::Arc;

use axum::{extract::Path, response::IntoResponse, Extension, Json};
use axum_macros::debug_handler;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;

use crate::{
    context::Context,
    utils::{
        badge_utils::Badge,
        discord_utils::{extract_invite_code, fetch_invite},
        session_utils, user_utils, ProfileServerError,
    },
};

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub username: String,
    pub bio: String,
    pub avatar: String,
    pub background: String,
    pub badges: Vec<Badge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    pub profile_views: i32,
    pub music_url: String,
    pub text_glow: bool,
    pub text_color: String,
    pub custom_font: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_invite: Option<serde_json::Value>,
}

//Public view. Counts at most one view per browser session per target; the
//tracking token does not require being logged in.
#[debug_handler]
pub async fn user_profile(
    Extension(ctx): Extension<Arc<Context>>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ProfileServerError> {
    let user = user_utils::get_user(&ctx.pool, &username)
        .await?
        .ok_or(ProfileServerError::UserNotFound)?;

    let (jar, token) = match jar.get(session_utils::SESSION_COOKIE) {
        Some(cookie) => {
            let token = cookie.value().to_string();
            (jar, token)
        }
        None => {
            let token = session_utils::new_session_token();
            let jar = jar.add(
                Cookie::build((session_utils::SESSION_COOKIE, token.clone()))
                    .path("/")
                    .http_only(true)
                    .build(),
            );
            (jar, token)
        }
    };

    //The rendered count is the value read before the increment, so a first
    //visit shows the count as it stood when the page was requested.
    if !session_utils::has_viewed(&ctx.redis, &token, &user.username).await? {
        user_utils::increment_profile_views(&ctx.pool, &user.username).await?;
        session_utils::mark_viewed(
            &ctx.redis,
            &token,
            &user.username,
            ctx.config.session_ttl_seconds,
        )
        .await?;
    }

    let badges = ctx.badges.resolve_set(&user.badge_names());

    let discord_invite = match extract_invite_code(&user.discord_server) {
        None => None,
        Some(code) => fetch_invite(&ctx.config.discord_api_url, &code).await,
    };

    let github = if user.show_github == 1 && !user.github.is_empty() {
        Some(user.github.clone())
    } else {
        None
    };

    let discord = if user.show_discord == 1 && !user.discord.is_empty() {
        Some(user.discord.clone())
    } else {
        None
    };

    Ok((
        jar,
        Json(PublicProfile {
            username: user.username,
            bio: user.bio,
            avatar: user.avatar,
            background: user.background,
            badges,
            github,
            discord,
            profile_views: user.profile_views,
            music_url: user.music_url,
            text_glow: user.text_glow == 1,
            text_color: user.text_color,
            custom_font: user.custom_font,
            discord_invite,
        }),
    ))
}
