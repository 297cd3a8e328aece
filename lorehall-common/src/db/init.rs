//! Database initialization
//!
//! Creates the schema on first run and seeds default site settings.
//! All statements are idempotent, so startup is safe against an already
//! initialized database.

use crate::db::settings;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    settings::init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
///
/// Exposed for tests that run against an in-memory database.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_events_table(pool).await?;
    create_entries_table(pool).await?;
    create_entry_lines_table(pool).await?;
    create_tags_tables(pool).await?;
    create_sources_tables(pool).await?;
    create_related_sites_table(pool).await?;
    create_users_tables(pool).await?;
    create_settings_table(pool).await?;
    Ok(())
}

async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            date TEXT NOT NULL,
            location TEXT,
            review_state TEXT NOT NULL DEFAULT 'pending',
            hidden INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_date ON events(date)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            guid TEXT PRIMARY KEY,
            event_id TEXT NOT NULL REFERENCES events(guid) ON DELETE CASCADE,
            display_order INTEGER NOT NULL DEFAULT 0,
            approved INTEGER NOT NULL DEFAULT 0,
            hidden INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_event ON entries(event_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_entry_lines_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entry_lines (
            guid TEXT PRIMARY KEY,
            entry_id TEXT NOT NULL REFERENCES entries(guid) ON DELETE CASCADE,
            line_order INTEGER NOT NULL DEFAULT 0,
            speaker TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entry_lines_entry ON entry_lines(entry_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_tags_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entry_tags (
            tag_id TEXT NOT NULL REFERENCES tags(guid) ON DELETE CASCADE,
            entry_id TEXT NOT NULL REFERENCES entries(guid) ON DELETE CASCADE,
            PRIMARY KEY (tag_id, entry_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_tags (
            tag_id TEXT NOT NULL REFERENCES tags(guid) ON DELETE CASCADE,
            event_id TEXT NOT NULL REFERENCES events(guid) ON DELETE CASCADE,
            PRIMARY KEY (tag_id, event_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sources_tables(pool: &SqlitePool) -> Result<()> {
    for table in ["audio_sources", "image_sources"] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                guid TEXT PRIMARY KEY,
                event_id TEXT NOT NULL REFERENCES events(guid) ON DELETE CASCADE,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                approved INTEGER NOT NULL DEFAULT 0,
                hidden INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            table
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn create_related_sites_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS related_sites (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            image_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_settings (
            user_id TEXT PRIMARY KEY REFERENCES users(guid) ON DELETE CASCADE,
            page_length INTEGER NOT NULL DEFAULT 25,
            timezone TEXT NOT NULL DEFAULT 'UTC'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
