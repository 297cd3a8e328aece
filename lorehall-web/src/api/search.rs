//! Advanced search page

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

use crate::api::auth::page_length_for_request;
use crate::api::pages::{entry_html, pagination_nav};
use crate::api::ui::{html_escape, render_page};
use crate::search::{self, Ordering, SearchFilter};
use crate::AppState;
use lorehall_common::db::{entries, events};

/// GET /search?query=&tags=&speaker=&date_from=&date_to=&ordering=&page=
///
/// Renders the advanced search form plus, when any filter is active, the
/// scored and paginated results. Elapsed evaluation time is measured for
/// display only.
pub async fn adv_search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Html<String>, SearchError> {
    let filters = search::init_filters(&params);
    let ordering = Ordering::from_param(params.get("ordering").map(String::as_str));
    let search_params = search::serialize_search_params(ordering, &filters);
    let search_done = filters.iter().any(SearchFilter::is_active);

    let mut body = String::new();
    body.push_str(&search_form(&params, ordering));

    if search_done {
        let start_time = Instant::now();

        let entries_scores = search::execute_filters(&state.db, &filters).await?;
        let ordered = search::get_search_results(&state.db, entries_scores, ordering).await?;

        let page_length = page_length_for_request(&state.db, &headers).await;
        let (page_ids, pagination) = search::paginate_search_results(
            &ordered,
            params.get("page").map(String::as_str),
            page_length,
        );

        let details = entries::load_details_ordered(&state.db, &page_ids).await?;
        let search_time = start_time.elapsed();

        debug!(
            active_filters = filters.iter().filter(|f| f.is_active()).count(),
            results = ordered.len(),
            elapsed_ms = search_time.as_millis() as u64,
            "Search evaluated"
        );

        let descriptions: Vec<String> =
            filters.iter().filter_map(SearchFilter::describe).collect();
        body.push_str(&format!(
            "<p class=\"search-meta\">{} results for {} &middot; ordered by {} \
             &middot; {:.3}s</p>\n",
            ordered.len(),
            html_escape(&descriptions.join("; ")),
            ordering.as_param(),
            search_time.as_secs_f64()
        ));

        for detail in &details {
            let event = events::load_event(&state.db, detail.entry.event_id).await?;
            body.push_str(&entry_html(detail, event.as_ref()));
        }

        body.push_str(&pagination_nav("/search", &search_params, &pagination));
    }

    Ok(render_page("Search", &body))
}

/// Render the search form with current parameter values echoed back
fn search_form(params: &HashMap<String, String>, ordering: Ordering) -> String {
    let value = |key: &str| html_escape(params.get(key).map(String::as_str).unwrap_or(""));

    let (rank_sel, date_sel) = match ordering {
        Ordering::Rank => (" selected", ""),
        Ordering::Date => ("", " selected"),
    };

    format!(
        r#"<form class="search-form" method="get" action="/search">
<label>Text</label>
<input type="text" name="query" value="{query}">
<label>Tags (comma separated)</label>
<input type="text" name="tags" value="{tags}">
<label>Speaker</label>
<input type="text" name="speaker" value="{speaker}">
<label>From date</label>
<input type="date" name="date_from" value="{date_from}">
<label>To date</label>
<input type="date" name="date_to" value="{date_to}">
<label>Ordering</label>
<select name="ordering">
<option value="rank"{rank_sel}>relevance</option>
<option value="date"{date_sel}>date</option>
</select>
<br><button type="submit">Search</button>
</form>
"#,
        query = value("query"),
        tags = value("tags"),
        speaker = value("speaker"),
        date_from = value("date_from"),
        date_to = value("date_to"),
        rank_sel = rank_sel,
        date_sel = date_sel,
    )
}

/// Search errors
#[derive(Debug)]
pub enum SearchError {
    DatabaseError(String),
}

impl From<lorehall_common::Error> for SearchError {
    fn from(e: lorehall_common::Error) -> Self {
        SearchError::DatabaseError(e.to_string())
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SearchError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
        };

        let body = format!("<p>{}</p>", html_escape(&message));
        (status, render_page("Server error", &body)).into_response()
    }
}
