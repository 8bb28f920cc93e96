use sqlx::prelude::FromRow;

#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,

    //bcrypt hash, never the raw password
    pub password: String,
    pub bio: String,
    //Relative upload path or an external URL
    pub avatar: String,
    pub background: String,
    //Comma-joined badge names; resolved against the registry at render time
    pub badges: String,
    pub is_admin: i32,
    pub github: String,
    pub discord: String,
    pub profile_views: i32,
    pub created_at: sqlx::types::chrono::NaiveDateTime,
    pub show_discord: i32,
    pub show_github: i32,
    pub music_url: String,
    pub discord_server: String,
    pub text_glow: i32,
    pub text_color: String,
    pub custom_font: String,
}

impl User {
    pub fn badge_names(&self) -> Vec<String> {
        if self.badges.is_empty() {
            return Vec::new();
        }

        self.badges
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}
