//! Tag endpoints: autocomplete JSON and the tags index page

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ui::{html_escape, render_page};
use crate::AppState;
use lorehall_common::db::models::TagUsage;
use lorehall_common::db::tags;

/// Query parameters for tag autocomplete
#[derive(Debug, Deserialize)]
pub struct TagQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/tags?q=
///
/// Tag list for autocomplete widgets: `{"results": [{"id", "text"}]}`,
/// sorted by descending combined entry+event usage.
pub async fn get_tags(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> Result<Json<Value>, TagError> {
    let usages = tags::suggest(&state.db, query.q.trim()).await?;

    let results: Vec<Value> = usages
        .iter()
        .map(|usage| {
            json!({
                "id": usage.name,
                "text": format!("{} ({})", usage.name, usage.total()),
            })
        })
        .collect();

    Ok(Json(json!({ "results": results })))
}

/// GET /tags
///
/// Tag index page: tags grouped by entry usage and by event usage, both
/// descending.
pub async fn tags_list(State(state): State<AppState>) -> Result<Html<String>, TagError> {
    let entry_usage = tags::entry_usage(&state.db).await?;
    let event_usage = tags::event_usage(&state.db).await?;

    let mut body = String::new();

    body.push_str("<h2>Entry tags</h2>\n");
    body.push_str(&usage_groups(&entry_usage, |u| u.entry_count));

    body.push_str("<h2>Event tags</h2>\n");
    body.push_str(&usage_groups(&event_usage, |u| u.event_count));

    Ok(render_page("Tags", &body))
}

/// Render usage-grouped tag lists: one line per usage count, descending
fn usage_groups(usages: &[TagUsage], count_of: impl Fn(&TagUsage) -> i64) -> String {
    let mut html = String::new();
    let mut current_count: Option<i64> = None;
    let mut group: Vec<&TagUsage> = Vec::new();

    // usages arrive sorted descending, so groups are contiguous
    for usage in usages {
        let count = count_of(usage);
        if current_count != Some(count) {
            flush_group(current_count, &mut group, &mut html);
            current_count = Some(count);
        }
        group.push(usage);
    }
    flush_group(current_count, &mut group, &mut html);

    if html.is_empty() {
        html.push_str("<p class=\"stats\">No tags in use yet.</p>\n");
    }

    html
}

fn flush_group(count: Option<i64>, group: &mut Vec<&TagUsage>, html: &mut String) {
    let Some(count) = count else { return };
    if group.is_empty() {
        return;
    }

    let names: Vec<String> = group
        .iter()
        .map(|u| {
            format!(
                "<a href=\"/search?tags={}\">{}</a>",
                crate::search::encode_param(&u.name),
                html_escape(&u.name)
            )
        })
        .collect();
    html.push_str(&format!(
        "<div class=\"tag-group\"><strong>{}</strong>: {}</div>\n",
        count,
        names.join(", ")
    ));
    group.clear();
}

/// Tag errors
#[derive(Debug)]
pub enum TagError {
    DatabaseError(String),
}

impl From<lorehall_common::Error> for TagError {
    fn from(e: lorehall_common::Error) -> Self {
        TagError::DatabaseError(e.to_string())
    }
}

impl IntoResponse for TagError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TagError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
