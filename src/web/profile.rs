use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::debug;

use crate::{
    context::Context,
    utils::{
        upload_utils::{allowed_file, store_upload, UploadKind},
        user_utils::{self, ProfileUpdate},
        ProfileServerError,
    },
    web::current_username,
};

pub struct ParsedForm {
    files: HashMap<String, (String, Bytes)>,
    fields: HashMap<String, String>,
}

impl ParsedForm {
    //A malformed or truncated body is a parse error, never a partial form:
    //the caller must not run the rewrite-every-column update from it.
    pub async fn from_multipart(mut data: Multipart) -> Result<Self, MultipartError> {
        let mut files = HashMap::new();
        let mut fields = HashMap::new();

        while let Some(field) = data.next_field().await? {
            let name = match field.name() {
                None => continue,
                Some(name) => name.to_string(),
            };

            if let Some(filename) = field.file_name() {
                let filename = filename.to_string();
                files.insert(name, (filename, field.bytes().await?));
                continue;
            }

            fields.insert(name, field.text().await?);
        }

        Ok(Self { files, fields })
    }

    //Absent fields read as empty string; the update rewrites every column,
    //so a field the form does not resubmit is cleared.
    pub fn get_field(&self, field_name: &str) -> String {
        self.fields.get(field_name).cloned().unwrap_or_default()
    }

    //For the one field with a non-empty default: the default applies only
    //when the field is absent, an explicitly-empty submission stays empty.
    pub fn get_field_or(&self, field_name: &str, default: &str) -> String {
        self.fields
            .get(field_name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    //HTML checkboxes submit "on" when ticked and nothing otherwise.
    pub fn get_checkbox(&self, field_name: &str) -> i32 {
        if self.fields.get(field_name).map(String::as_str) == Some("on") {
            1
        } else {
            0
        }
    }

    pub fn get_file(&self, field_name: &str) -> Option<&(String, Bytes)> {
        self.files
            .get(field_name)
            .filter(|(_, bytes)| !bytes.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct EditableProfile {
    pub username: String,
    pub bio: String,
    pub avatar: String,
    pub background: String,
    pub github: String,
    pub discord: String,
    pub discord_server: String,
    pub show_discord: bool,
    pub show_github: bool,
    pub text_glow: bool,
    pub text_color: String,
    pub custom_font: String,
    pub music_url: String,
}

pub async fn edit_profile_view(
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

    Ok(Json(EditableProfile {
        username: user.username,
        bio: user.bio,
        avatar: user.avatar,
        background: user.background,
        github: user.github,
        discord: user.discord,
        discord_server: user.discord_server,
        show_discord: user.show_discord == 1,
        show_github: user.show_github == 1,
        text_glow: user.text_glow == 1,
        text_color: user.text_color,
        custom_font: user.custom_font,
        music_url: user.music_url,
    })
    .into_response())
}

//Resolution order for avatar and background: explicit URL beats an uploaded
//file; a rejected upload is silently ignored and the stored path survives.
async fn resolve_media(
    ctx: &Context,
    form: &ParsedForm,
    kind: UploadKind,
    username: &str,
    url_field: &str,
    file_field: &str,
    current: &str,
) -> Result<String, ProfileServerError> {
    let url = form.get_field(url_field).trim().to_string();
    if !url.is_empty() {
        return Ok(url);
    }

    if let Some((filename, bytes)) = form.get_file(file_field) {
        if allowed_file(filename) {
            return store_upload(&ctx.config.data_dir, kind, username, filename, bytes.clone())
                .await;
        }

        debug!("Ignoring upload with disallowed extension: {}", filename);
    }

    Ok(current.to_string())
}

pub async fn edit_profile_submit(
    Extension(ctx): Extension<Arc<Context>>,
    jar: CookieJar,
    data: Multipart,
) -> Result<axum::response::Response, ProfileServerError> {
    let username = match current_username(&ctx, &jar).await? {
        None => return Ok(Redirect::to("/login").into_response()),
        Some(username) => username,
    };

    let user = user_utils::get_user(&ctx.pool, &username)
        .await?
        .ok_or(ProfileServerError::UserNotFound)?;

    let form = match ParsedForm::from_multipart(data).await {
        Err(error) => {
            debug!("Rejecting malformed profile form: {}", error);
            return Ok((StatusCode::BAD_REQUEST, "Malformed form submission").into_response());
        }
        Ok(form) => form,
    };

    let avatar = resolve_media(
        &ctx,
        &form,
        UploadKind::Avatar,
        &username,
        "avatar_url",
        "avatar",
        &user.avatar,
    )
    .await?;

    let background = resolve_media(
        &ctx,
        &form,
        UploadKind::Background,
        &username,
        "background_url",
        "background",
        &user.background,
    )
    .await?;

    let text_color = form.get_field_or("text_color", "#ffffff").trim().to_string();

    let update = ProfileUpdate {
        bio: form.get_field("bio"),
        avatar,
        background,
        github: form.get_field("github"),
        discord: form.get_field("discord"),
        show_discord: form.get_checkbox("show_discord"),
        show_github: form.get_checkbox("show_github"),
        discord_server: form.get_field("discord_server"),
        text_glow: form.get_checkbox("text_glow"),
        text_color,
        custom_font: form.get_field("custom_font").trim().to_string(),
        music_url: form.get_field("music_url").trim().to_string(),
    };

    user_utils::update_profile(&ctx.pool, &username, &update).await?;

    Ok(Redirect::to("/dashboard").into_response())
}

pub fn router() -> Router {
    Router::new().route(
        "/edit_profile",
        get(edit_profile_view).post(edit_profile_submit),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{body::Body, extract::FromRequest, http::Request};

    async fn multipart_from(body: &'static str) -> Multipart {
        let request = Request::builder()
            .header("content-type", "multipart/form-data; boundary=BOUND")
            .body(Body::from(body))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    fn form_with(fields: &[(&str, &str)]) -> ParsedForm {
        ParsedForm {
            files: HashMap::new(),
            fields: fields
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    //Pinned behavior: a text field the form does not resubmit is written
    //back as empty string, clearing any previous value.
    #[test]
    fn absent_fields_read_as_empty() {
        let form = form_with(&[("bio", "hello")]);

        assert_eq!(form.get_field("bio"), "hello");
        assert_eq!(form.get_field("github"), "");
    }

    #[test]
    fn checkboxes_only_count_when_on() {
        let form = form_with(&[("show_github", "on"), ("text_glow", "off")]);

        assert_eq!(form.get_checkbox("show_github"), 1);
        assert_eq!(form.get_checkbox("text_glow"), 0);
        assert_eq!(form.get_checkbox("show_discord"), 0);
    }

    #[test]
    fn empty_file_fields_are_ignored() {
        let mut form = form_with(&[]);
        form.files
            .insert("avatar".to_string(), ("a.png".to_string(), Bytes::new()));

        assert!(form.get_file("avatar").is_none());
    }

    #[test]
    fn defaulted_field_only_defaults_when_absent() {
        let absent = form_with(&[]);
        assert_eq!(absent.get_field_or("text_color", "#ffffff"), "#ffffff");

        //An explicitly-empty submission stays empty, like every other field.
        let empty = form_with(&[("text_color", "")]);
        assert_eq!(empty.get_field_or("text_color", "#ffffff"), "");

        let set = form_with(&[("text_color", "#ff00ff")]);
        assert_eq!(set.get_field_or("text_color", "#ffffff"), "#ff00ff");
    }

    #[tokio::test]
    async fn well_formed_multipart_parses_fields_and_files() {
        let multipart = multipart_from(
            "--BOUND\r\n\
             Content-Disposition: form-data; name=\"bio\"\r\n\r\n\
             hello\r\n\
             --BOUND\r\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNG\r\n\
             --BOUND--\r\n",
        )
        .await;

        let form = ParsedForm::from_multipart(multipart).await.unwrap();

        assert_eq!(form.get_field("bio"), "hello");
        let (filename, bytes) = form.get_file("avatar").unwrap();
        assert_eq!(filename, "a.png");
        assert_eq!(bytes.as_ref(), b"PNG");
    }

    //A truncated body must surface as an error, not as a partial form that
    //would then clear every column the parser never reached.
    #[tokio::test]
    async fn truncated_multipart_is_a_parse_error() {
        let multipart = multipart_from(
            "--BOUND\r\n\
             Content-Disposition: form-data; name=\"bio\"\r\n\r\n\
             hel",
        )
        .await;

        assert!(ParsedForm::from_multipart(multipart).await.is_err());
    }
}
