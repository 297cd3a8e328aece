//! Per-user settings page
//!
//! Both routes sit behind the session middleware, which guarantees the
//! user-id extension is present.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::ui::{html_escape, render_page};
use crate::AppState;
use lorehall_common::db::models::UserSettings;
use lorehall_common::db::sessions;
use lorehall_common::db::settings::{MAX_PAGE_LENGTH, MIN_PAGE_LENGTH};

/// Form fields for the settings update
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub page_length: i64,
    pub timezone: String,
}

/// GET /settings
///
/// Settings form for the authenticated user.
pub async fn settings_page(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Html<String>, SettingsError> {
    let user_settings = sessions::load_user_settings(&state.db, user_id).await?;

    let body = format!(
        r#"<h2>Your settings</h2>
<form class="search-form" method="post" action="/settings">
<label>Entries per page ({min}-{max})</label>
<input type="number" name="page_length" min="{min}" max="{max}" value="{page_length}">
<label>Timezone</label>
<input type="text" name="timezone" value="{timezone}">
<br><button type="submit">Save</button>
</form>
"#,
        min = MIN_PAGE_LENGTH,
        max = MAX_PAGE_LENGTH,
        page_length = user_settings.page_length,
        timezone = html_escape(&user_settings.timezone),
    );

    Ok(render_page("Settings", &body))
}

/// POST /settings
///
/// Persist the submitted settings, then redirect back to the form.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Form(form): Form<SettingsForm>,
) -> Result<Redirect, SettingsError> {
    let updated = UserSettings {
        user_id,
        page_length: form.page_length,
        timezone: form.timezone.trim().to_string(),
    };

    sessions::save_user_settings(&state.db, &updated).await?;

    Ok(Redirect::to("/settings"))
}

/// Settings errors
#[derive(Debug)]
pub enum SettingsError {
    InvalidInput(String),
    DatabaseError(String),
}

impl From<lorehall_common::Error> for SettingsError {
    fn from(e: lorehall_common::Error) -> Self {
        match e {
            lorehall_common::Error::InvalidInput(msg) => SettingsError::InvalidInput(msg),
            other => SettingsError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for SettingsError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SettingsError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            SettingsError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
        };

        let body = format!("<p>{}</p>", html_escape(&message));
        (status, render_page("Settings", &body)).into_response()
    }
}
