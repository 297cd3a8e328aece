//! Site settings
//!
//! Key/value configuration stored in the settings table, with typed
//! accessors and seeded defaults.

use crate::{Error, Result};
use sqlx::SqlitePool;

/// Default entries per page when no user setting applies
pub const DEFAULT_PAGE_LENGTH: i64 = 25;

/// Bounds for a user-chosen page length
pub const MIN_PAGE_LENGTH: i64 = 5;
pub const MAX_PAGE_LENGTH: i64 = 500;

/// Seed default settings on first run (INSERT OR IGNORE keeps existing
/// values)
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    let defaults: &[(&str, &str)] = &[
        ("default_page_length", "25"),
        (
            "index_welcome_text",
            "Welcome to the archive. Browse events, search entries, follow tags.",
        ),
        (
            "approval_message",
            "Entries are reviewed by the archive staff before publication.",
        ),
        (
            "review_reviewed_explanation",
            "This event has been reviewed and its entries are verified.",
        ),
        (
            "review_pending_explanation",
            "This event is awaiting review; entries may still change.",
        ),
    ];

    for (key, value) in defaults {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Default page length for anonymous visitors
pub async fn get_default_page_length(pool: &SqlitePool) -> Result<i64> {
    Ok(get_setting::<i64>(pool, "default_page_length")
        .await?
        .unwrap_or(DEFAULT_PAGE_LENGTH)
        .clamp(MIN_PAGE_LENGTH, MAX_PAGE_LENGTH))
}

/// Welcome text shown on the home page
pub async fn get_welcome_text(pool: &SqlitePool) -> Result<String> {
    Ok(get_setting(pool, "index_welcome_text").await?.unwrap_or_default())
}

/// Blurb shown above event entries about the review process
pub async fn get_approval_message(pool: &SqlitePool) -> Result<String> {
    Ok(get_setting(pool, "approval_message").await?.unwrap_or_default())
}

/// Explanation matching an event's review state, empty for unknown states
pub async fn get_review_explanation(pool: &SqlitePool, review_state: &str) -> Result<String> {
    let key = match review_state {
        crate::db::models::REVIEW_APPROVED => "review_reviewed_explanation",
        crate::db::models::REVIEW_PENDING => "review_pending_explanation",
        _ => return Ok(String::new()),
    };
    Ok(get_setting(pool, key).await?.unwrap_or_default())
}

/// Generic setting getter (internal)
async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter
pub async fn set_setting<T>(pool: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn defaults_are_seeded_once() {
        let pool = setup_test_db().await;

        init_default_settings(&pool).await.unwrap();
        set_setting(&pool, "default_page_length", 50).await.unwrap();

        // Re-seeding must not clobber the changed value
        init_default_settings(&pool).await.unwrap();
        assert_eq!(get_default_page_length(&pool).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn page_length_falls_back_and_clamps() {
        let pool = setup_test_db().await;
        assert_eq!(
            get_default_page_length(&pool).await.unwrap(),
            DEFAULT_PAGE_LENGTH
        );

        set_setting(&pool, "default_page_length", 100_000).await.unwrap();
        assert_eq!(get_default_page_length(&pool).await.unwrap(), MAX_PAGE_LENGTH);
    }

    #[tokio::test]
    async fn review_explanation_by_state() {
        let pool = setup_test_db().await;
        init_default_settings(&pool).await.unwrap();

        let approved = get_review_explanation(&pool, "approved").await.unwrap();
        assert!(approved.contains("reviewed"));

        let unknown = get_review_explanation(&pool, "weird").await.unwrap();
        assert!(unknown.is_empty());
    }
}
