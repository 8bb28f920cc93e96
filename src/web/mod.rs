pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod profile;
pub mod user_page;

use std::sync::Arc;

use axum::{response::Html, routing::get, Extension, Router};
use axum_extra::extract::cookie::CookieJar;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{
    context::Context,
    health_check,
    utils::{session_utils, ProfileServerError},
};

//Resolves the session cookie to a logged-in username, if any.
pub async fn current_username(
    ctx: &Context,
    jar: &CookieJar,
) -> Result<Option<String>, ProfileServerError> {
    let token = match jar.get(session_utils::SESSION_COOKIE) {
        None => return Ok(None),
        Some(cookie) => cookie.value().to_string(),
    };

    session_utils::session_username(&ctx.redis, &token).await
}

async fn landing() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html>
  <body>
    <h1>glim</h1>
    <p>Claim your page.</p>
    <p><a href="/signup">Sign up</a> | <a href="/login">Log in</a></p>
  </body>
</html>"#,
    )
}

pub async fn serve(ctx: Context) {
    let port = ctx.config.port.unwrap_or(3000);
    let ctx = Arc::new(ctx);

    let layer_ctx = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(true)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .layer(Extension(ctx));

    let router = Router::new()
        .route("/", get(landing))
        .route("/health", get(health_check))
        .merge(crate::web::auth::router())
        .merge(crate::web::profile::router())
        .merge(crate::web::dashboard::router())
        .merge(crate::web::admin::router())
        //Static routes above win over this catch-all path segment.
        .route("/:username", get(crate::web::user_page::user_profile))
        .layer(layer_ctx);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    axum::serve(listener, router).await.unwrap();
}
