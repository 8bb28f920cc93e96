use std::sync::Arc;

use axum::{
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Extension, Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    context::Context,
    utils::{session_utils, user_utils, ProfileServerError},
};

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

async fn signup_page() -> Html<&'static str> {
    Html(
        r#"<form method="post" action="/signup">
  <input name="username" placeholder="username" />
  <input name="password" type="password" placeholder="password" />
  <button>Sign up</button>
</form>"#,
    )
}

async fn login_page() -> Html<&'static str> {
    Html(
        r#"<form method="post" action="/login">
  <input name="username" placeholder="username" />
  <input name="password" type="password" placeholder="password" />
  <button>Log in</button>
</form>"#,
    )
}

pub async fn signup(
    Extension(ctx): Extension<Arc<Context>>,
    Form(form): Form<CredentialsForm>,
) -> Result<axum::response::Response, ProfileServerError> {
    let username = form.username.trim();
    let password = form.password.trim();

    if username.is_empty() || password.is_empty() {
        return Ok((
            axum::http::StatusCode::BAD_REQUEST,
            "Username and password required",
        )
            .into_response());
    }

    //Usernames become the public profile path and an upload path prefix.
    if !user_utils::valid_username(username) {
        return Ok((
            axum::http::StatusCode::BAD_REQUEST,
            "Username may only contain letters, digits, _ and -",
        )
            .into_response());
    }

    let password_hash = match bcrypt::hash(password, bcrypt::DEFAULT_COST) {
        Err(error) => {
            warn!("Failed to hash password: {}", error);
            return Err(ProfileServerError::Internal(error.to_string()));
        }
        Ok(hash) => hash,
    };

    user_utils::create_user(&ctx.pool, username, &password_hash).await?;

    //A configured owner gets the admin flag the moment the account exists,
    //not only at the next startup pass.
    if user_utils::is_bootstrap_owner(&ctx.config.owner_usernames, username) {
        user_utils::promote_owners(&ctx.pool, &[username.to_string()]).await?;
    }

    Ok(Redirect::to("/login").into_response())
}

pub async fn login(
    Extension(ctx): Extension<Arc<Context>>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<impl IntoResponse, ProfileServerError> {
    let username = form.username.trim();
    let password = form.password.trim();

    let user = user_utils::get_user(&ctx.pool, username).await?;

    //Missing user and wrong password produce the same outcome on purpose.
    let user = match user {
        None => return Err(ProfileServerError::InvalidCredentials),
        Some(user) => user,
    };

    match bcrypt::verify(password, &user.password) {
        Err(_) | Ok(false) => Err(ProfileServerError::InvalidCredentials),
        Ok(true) => {
            let token = session_utils::new_session_token();
            session_utils::create_session(
                &ctx.redis,
                &token,
                &user.username,
                ctx.config.session_ttl_seconds,
            )
            .await?;

            info!("Started session for {}", user.username);

            let jar = jar.add(
                Cookie::build((session_utils::SESSION_COOKIE, token))
                    .path("/")
                    .http_only(true)
                    .build(),
            );

            Ok((jar, Redirect::to("/dashboard")))
        }
    }
}

//Idempotent; clearing an absent session is fine.
pub async fn logout(
    Extension(ctx): Extension<Arc<Context>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ProfileServerError> {
    if let Some(cookie) = jar.get(session_utils::SESSION_COOKIE) {
        session_utils::destroy_session(&ctx.redis, cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build((session_utils::SESSION_COOKIE, "")).path("/"));

    Ok((jar, Redirect::to("/login")))
}

pub fn router() -> Router {
    Router::new()
        .route("/signup", get(signup_page).post(signup))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}
