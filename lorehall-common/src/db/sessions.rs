//! Session tokens and per-user settings
//!
//! Sessions are opaque tokens handed out after authentication (which is
//! external to this service) and looked up by the settings middleware.

use crate::db::models::UserSettings;
use crate::db::settings::{DEFAULT_PAGE_LENGTH, MAX_PAGE_LENGTH, MIN_PAGE_LENGTH};
use crate::{Error, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Generate an opaque session token: SHA-256 over 32 random bytes, hex
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);

    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Create a session for a user and return the token
pub async fn create_session(pool: &SqlitePool, user_id: Uuid) -> Result<String> {
    let token = generate_token();

    sqlx::query("INSERT INTO sessions (token, user_id) VALUES (?, ?)")
        .bind(&token)
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a session token to its user id, None when unknown
pub async fn lookup_session(pool: &SqlitePool, token: &str) -> Result<Option<Uuid>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT user_id FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((user_id,)) => Ok(Some(
            Uuid::parse_str(&user_id)
                .map_err(|e| Error::Internal(format!("Bad session user id: {}", e)))?,
        )),
        None => Ok(None),
    }
}

/// Load a user's settings, defaults when the user has never saved any
pub async fn load_user_settings(pool: &SqlitePool, user_id: Uuid) -> Result<UserSettings> {
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT page_length, timezone FROM user_settings WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(match row {
        Some((page_length, timezone)) => UserSettings {
            user_id,
            page_length,
            timezone,
        },
        None => UserSettings {
            user_id,
            page_length: DEFAULT_PAGE_LENGTH,
            timezone: "UTC".to_string(),
        },
    })
}

/// Save a user's settings, validating the page length bounds
pub async fn save_user_settings(pool: &SqlitePool, settings: &UserSettings) -> Result<()> {
    if settings.page_length < MIN_PAGE_LENGTH || settings.page_length > MAX_PAGE_LENGTH {
        return Err(Error::InvalidInput(format!(
            "page_length must be between {} and {}",
            MIN_PAGE_LENGTH, MAX_PAGE_LENGTH
        )));
    }

    sqlx::query(
        "INSERT INTO user_settings (user_id, page_length, timezone) VALUES (?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
            page_length = excluded.page_length,
            timezone = excluded.timezone",
    )
    .bind(settings.user_id.to_string())
    .bind(settings.page_length)
    .bind(&settings.timezone)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;

    async fn setup_test_db() -> (SqlitePool, Uuid) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_schema(&pool).await.unwrap();

        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (guid, username) VALUES (?, 'tester')")
            .bind(user_id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        (pool, user_id)
    }

    #[test]
    fn tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn session_roundtrip() {
        let (pool, user_id) = setup_test_db().await;

        let token = create_session(&pool, user_id).await.unwrap();
        let found = lookup_session(&pool, &token).await.unwrap();
        assert_eq!(found, Some(user_id));

        let missing = lookup_session(&pool, "no-such-token").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn settings_default_then_save() {
        let (pool, user_id) = setup_test_db().await;

        let initial = load_user_settings(&pool, user_id).await.unwrap();
        assert_eq!(initial.page_length, DEFAULT_PAGE_LENGTH);

        let updated = UserSettings {
            user_id,
            page_length: 50,
            timezone: "Europe/Warsaw".to_string(),
        };
        save_user_settings(&pool, &updated).await.unwrap();

        let loaded = load_user_settings(&pool, user_id).await.unwrap();
        assert_eq!(loaded.page_length, 50);
        assert_eq!(loaded.timezone, "Europe/Warsaw");
    }

    #[tokio::test]
    async fn settings_reject_out_of_bounds_page_length() {
        let (pool, user_id) = setup_test_db().await;

        let bad = UserSettings {
            user_id,
            page_length: 0,
            timezone: "UTC".to_string(),
        };
        assert!(save_user_settings(&pool, &bad).await.is_err());
    }
}
