use std::path::Path;

use axum::body::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::error;

use super::ProfileServerError;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy)]
pub enum UploadKind {
    Avatar,
    Background,
}

impl UploadKind {
    pub fn subdir(&self) -> &'static str {
        match self {
            UploadKind::Avatar => "avatars",
            UploadKind::Background => "backgrounds",
        }
    }
}

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        None => false,
        Some((stem, extension)) => {
            !stem.is_empty() && ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str())
        }
    }
}

//Strips directory components and anything outside [A-Za-z0-9._-], so the
//stored path can never escape the upload tree.
pub fn sanitize_filename(filename: &str) -> String {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_matches('.');

    UNSAFE_CHARS.replace_all(basename, "_").to_string()
}

pub async fn store_upload(
    data_dir: &str,
    kind: UploadKind,
    username: &str,
    filename: &str,
    bytes: Bytes,
) -> Result<String, ProfileServerError> {
    let filename = sanitize_filename(filename);
    //Prefixing with the owner's username keeps users from colliding on a
    //shared filename. The username goes through the same character pass as
    //the filename; signup already rejects path characters, this keeps the
    //stored path a single component regardless.
    let owner = UNSAFE_CHARS.replace_all(username, "_");
    let relative = format!("uploads/{}/{}_{}", kind.subdir(), owner, filename);
    let target = Path::new(data_dir).join(&relative);

    if let Err(error) = tokio::fs::write(&target, bytes).await {
        error!("Failed to save upload {:?}: {}", target, error);
        return Err(ProfileServerError::Internal(error.to_string()));
    }

    Ok(relative)
}

pub fn ensure_upload_dirs(data_dir: &str) -> std::io::Result<()> {
    for kind in [UploadKind::Avatar, UploadKind::Background] {
        std::fs::create_dir_all(Path::new(data_dir).join("uploads").join(kind.subdir()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(allowed_file("me.png"));
        assert!(allowed_file("me.JPG"));
        assert!(allowed_file("me.Jpeg"));
    }

    #[test]
    fn disallowed_extensions_are_rejected() {
        assert!(!allowed_file("me.gif"));
        assert!(!allowed_file("me.png.exe"));
        assert!(!allowed_file("me"));
        assert!(!allowed_file(".png"));
    }

    #[test]
    fn sanitization_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_filename("a/b/c.png"), "c.png");
    }

    #[test]
    fn sanitization_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my pic (1).png"), "my_pic__1_.png");
        assert_eq!(sanitize_filename("snap;rm -rf.jpg"), "snap_rm_-rf.jpg");
    }

    #[test]
    fn sanitization_keeps_plain_names() {
        assert_eq!(sanitize_filename("avatar-v2.final.png"), "avatar-v2.final.png");
    }

    #[tokio::test]
    async fn stored_paths_stay_inside_the_upload_tree() {
        let data_dir = std::env::temp_dir().join("glim-upload-escape-test");
        let data_dir = data_dir.to_str().unwrap().to_string();
        ensure_upload_dirs(&data_dir).unwrap();

        let relative = store_upload(
            &data_dir,
            UploadKind::Avatar,
            "../../../escaped",
            "x.png",
            Bytes::from_static(b"img"),
        )
        .await
        .unwrap();

        //Path separators collapse to underscores, so the owner prefix is a
        //single path component under the avatars directory.
        assert_eq!(relative, "uploads/avatars/.._.._.._escaped_x.png");
        assert!(Path::new(&data_dir).join(&relative).exists());
        assert!(!std::path::Path::new(&data_dir)
            .parent()
            .unwrap()
            .join("escaped_x.png")
            .exists());
    }

    #[tokio::test]
    async fn upload_filename_is_sanitized_before_write() {
        let data_dir = std::env::temp_dir().join("glim-upload-filename-test");
        let data_dir = data_dir.to_str().unwrap().to_string();
        ensure_upload_dirs(&data_dir).unwrap();

        let relative = store_upload(
            &data_dir,
            UploadKind::Background,
            "alice",
            "../../evil.png",
            Bytes::from_static(b"img"),
        )
        .await
        .unwrap();

        assert_eq!(relative, "uploads/backgrounds/alice_evil.png");
        assert!(Path::new(&data_dir).join(&relative).exists());
    }
}
