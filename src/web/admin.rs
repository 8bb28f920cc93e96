use std::sync::Arc;

use axum::{
    response::{IntoResponse, Redirect},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::{cookie::CookieJar, Form};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    context::Context,
    utils::{badge_utils::Badge, user_utils, AccountSummary, ProfileServerError},
    web::current_username,
};

//The stored is_admin flag is the only gate here. The owner list in config
//merely seeds that flag at startup.
async fn require_admin(ctx: &Context, jar: &CookieJar) -> Result<String, ProfileServerError> {
    let username = current_username(ctx, jar)
        .await?
        .ok_or(ProfileServerError::AccessDenied)?;

    let user = user_utils::get_user(&ctx.pool, &username)
        .await?
        .ok_or(ProfileServerError::AccessDenied)?;

    if user.is_admin != 1 {
        return Err(ProfileServerError::AccessDenied);
    }

    Ok(username)
}

#[derive(Debug, Serialize)]
pub struct AdminPanel {
    pub accounts: Vec<AccountSummary>,
    pub available_badges: Vec<Badge>,
}

pub async fn admin_panel(
    Extension(ctx): Extension<Arc<Context>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ProfileServerError> {
    require_admin(&ctx, &jar).await?;

    Ok(Json(AdminPanel {
        accounts: user_utils::list_accounts(&ctx.pool).await?,
        available_badges: ctx.badges.assignable(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AdminForm {
    pub target_username: String,
    //Repeated checkbox field; axum-extra's Form collects multi-values.
    #[serde(default)]
    pub badges: Vec<String>,
    pub make_admin: Option<String>,
}

pub async fn admin_submit(
    Extension(ctx): Extension<Arc<Context>>,
    jar: CookieJar,
    Form(form): Form<AdminForm>,
) -> Result<impl IntoResponse, ProfileServerError> {
    let admin = require_admin(&ctx, &jar).await?;

    let target = form.target_username.trim();
    let badges = form.badges.join(",");
    let make_admin = if form.make_admin.is_some() { 1 } else { 0 };

    //Full replace of the badge set; the admin flag is always written too.
    user_utils::set_badges_and_admin(&ctx.pool, target, &badges, make_admin).await?;

    info!(
        "{} set badges=[{}] admin={} for {}",
        admin, badges, make_admin, target
    );

    Ok(Redirect::to("/admin"))
}

pub fn router() -> Router {
    Router::new().route("/admin", get(admin_panel).post(admin_submit))
}
