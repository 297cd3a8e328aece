//! Session middleware for protected routes
//!
//! A `lorehall_session` cookie carries an opaque token looked up in the
//! sessions table. The middleware attaches the resolved user id as a
//! request extension; handlers behind it can rely on its presence.
//! Issuing sessions (login) is external to this service.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::AppState;
use lorehall_common::db::{sessions, settings};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "lorehall_session";

/// Extract the session token from the Cookie header, if any
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;

    cookie_header.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Resolve the requesting user, None for anonymous or unknown tokens
pub async fn current_user(pool: &SqlitePool, headers: &HeaderMap) -> Option<Uuid> {
    let token = session_token(headers)?;
    match sessions::lookup_session(pool, &token).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Session lookup failed: {}", e);
            None
        }
    }
}

/// Entries-per-page for this request: the user's setting when a valid
/// session is presented, the site default otherwise
pub async fn page_length_for_request(pool: &SqlitePool, headers: &HeaderMap) -> i64 {
    if let Some(user_id) = current_user(pool, headers).await {
        if let Ok(user_settings) = sessions::load_user_settings(pool, user_id).await {
            return user_settings.page_length;
        }
    }

    settings::get_default_page_length(pool)
        .await
        .unwrap_or(settings::DEFAULT_PAGE_LENGTH)
}

/// Session middleware for the settings routes
///
/// Returns 401 Unauthorized when no valid session is presented.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id = current_user(&state.db, request.headers())
        .await
        .ok_or(AuthError::Unauthorized)?;

    request.extensions_mut().insert(user_id);

    Ok(next.run(request).await)
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "A valid session is required".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_extraction_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; lorehall_session=abc123; other=x"),
        );
        assert_eq!(session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("lorehall_session="));
        assert_eq!(session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }
}
