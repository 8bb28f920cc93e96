use sqlx::{Pool, Postgres};

pub mod user;

//Mirrors the columns in db::user::User; username is the identity key and is
//never renamed after insert.
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL,
        bio TEXT NOT NULL DEFAULT '',
        avatar TEXT NOT NULL DEFAULT '',
        background TEXT NOT NULL DEFAULT '',
        badges TEXT NOT NULL DEFAULT '',
        is_admin INTEGER NOT NULL DEFAULT 0,
        github TEXT NOT NULL DEFAULT '',
        discord TEXT NOT NULL DEFAULT '',
        profile_views INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        show_discord INTEGER NOT NULL DEFAULT 1,
        show_github INTEGER NOT NULL DEFAULT 1,
        music_url TEXT NOT NULL DEFAULT '',
        discord_server TEXT NOT NULL DEFAULT '',
        text_glow INTEGER NOT NULL DEFAULT 0,
        text_color TEXT NOT NULL DEFAULT '#ffffff',
        custom_font TEXT NOT NULL DEFAULT ''
    )
"#;

pub async fn init_schema(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA).execute(pool).await?;

    Ok(())
}
