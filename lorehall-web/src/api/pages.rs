//! Public archive pages: home, events listing, event page, entry redirect

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::api::auth::page_length_for_request;
use crate::api::ui::{html_escape, render_page};
use crate::pagination::{calculate_pagination, parse_page_param, Pagination};
use crate::AppState;
use lorehall_common::db::events::{EventSort, SortOrder};
use lorehall_common::db::models::{Event, EntryDetail};
use lorehall_common::db::{entries, events, settings, sources};
use lorehall_common::slug::slugify;

/// GET /
///
/// Home page: newest events with entries, archive statistics, newest
/// sources, related sites, welcome text.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Html<String>, PageError> {
    let page_length = page_length_for_request(&state.db, &headers).await;

    let newest_events = events::newest_with_entries(&state.db, page_length).await?;
    let events_count = events::count_visible(&state.db).await?;
    let entries_count = entries::count_visible(&state.db).await?;
    let sources_count = sources::count_visible_audio(&state.db).await?;
    let new_sources = sources::newest(&state.db, 5).await?;
    let related_sites = sources::related_sites(&state.db).await?;
    let welcome_text = settings::get_welcome_text(&state.db).await?;

    let mut body = String::new();
    body.push_str(&format!("<p>{}</p>\n", html_escape(&welcome_text)));
    body.push_str(&format!(
        "<p class=\"stats\">{} events &middot; {} entries &middot; {} audio sources</p>\n",
        events_count, entries_count, sources_count
    ));

    body.push_str("<h2>Newest events</h2>\n<ul>\n");
    for (event, entry_count) in &newest_events {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a> ({}) &mdash; {} entries</li>\n",
            event_url(event),
            html_escape(&event.name),
            event.date,
            entry_count
        ));
    }
    body.push_str("</ul>\n");

    if !new_sources.is_empty() {
        body.push_str("<h2>Newest sources</h2>\n<ul>\n");
        for source in &new_sources {
            body.push_str(&format!(
                "<li>[{}] <a href=\"{}\">{}</a></li>\n",
                source.kind.label(),
                html_escape(&source.url),
                html_escape(&source.title)
            ));
        }
        body.push_str("</ul>\n");
    }

    if !related_sites.is_empty() {
        body.push_str("<h2>Related sites</h2>\n<ul>\n");
        for site in &related_sites {
            body.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                html_escape(&site.url),
                html_escape(&site.name)
            ));
        }
        body.push_str("</ul>\n");
    }

    Ok(render_page("Home", &body))
}

/// GET /events?sort_by=name|date&sort_ord=asc|desc&page=N
///
/// Paginated listing of visible events. Invalid sort parameters fall back
/// to date descending; invalid pages are clamped.
pub async fn events_list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let sort = EventSort::from_param(params.get("sort_by").map(String::as_str));
    let order = SortOrder::from_param(params.get("sort_ord").map(String::as_str));

    let page_length = page_length_for_request(&state.db, &headers).await;
    let total = events::count_visible(&state.db).await?;
    let requested = parse_page_param(params.get("page").map(String::as_str));
    let p = calculate_pagination(total, requested, page_length);

    let listed = events::list_visible(&state.db, sort, order, p.page_length, p.offset).await?;

    let sort_param = match sort {
        EventSort::Name => "name",
        EventSort::Date => "date",
    };
    let ord_param = match order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    };

    let mut body = String::new();
    body.push_str(&format!(
        "<p class=\"stats\">{} events &middot; sorted by \
         <a href=\"/events?sort_by=name&sort_ord=asc\">name</a> | \
         <a href=\"/events?sort_by=date&sort_ord=desc\">date</a></p>\n",
        total
    ));

    body.push_str("<ul>\n");
    for event in &listed {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a> ({}){}</li>\n",
            event_url(event),
            html_escape(&event.name),
            event.date,
            event
                .location
                .as_deref()
                .map(|l| format!(" &mdash; {}", html_escape(l)))
                .unwrap_or_default()
        ));
    }
    body.push_str("</ul>\n");

    body.push_str(&pagination_nav(
        "/events",
        &format!("sort_by={}&sort_ord={}", sort_param, ord_param),
        &p,
    ));

    Ok(render_page("Events", &body))
}

/// GET /events/:id
///
/// Redirect to the canonical slugged URL.
pub async fn event_no_slug(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Redirect, PageError> {
    let event = load_visible_event(&state, &event_id).await?;
    Ok(Redirect::to(&event_url(&event)))
}

/// GET /events/:id/:slug
///
/// Single event page: visible entries in display order, sources, review
/// state explanation.
pub async fn view_event(
    State(state): State<AppState>,
    Path((event_id, _slug)): Path<(String, String)>,
) -> Result<Html<String>, PageError> {
    let event = load_visible_event(&state, &event_id).await?;

    let event_entries = entries::event_entries(&state.db, event.guid).await?;
    let event_sources = sources::event_sources(&state.db, event.guid).await?;
    let event_tags = events::event_tags(&state.db, event.guid).await?;
    let approval_msg = settings::get_approval_message(&state.db).await?;
    let review_explanation =
        settings::get_review_explanation(&state.db, &event.review_state).await?;

    let mut body = String::new();
    body.push_str(&format!(
        "<h2>{} ({})</h2>\n",
        html_escape(&event.name),
        event.date
    ));
    if let Some(location) = &event.location {
        body.push_str(&format!("<p class=\"stats\">{}</p>\n", html_escape(location)));
    }
    if !event_tags.is_empty() {
        body.push_str(&format!(
            "<p class=\"tags\">Tags: {}</p>\n",
            html_escape(&event_tags.join(", "))
        ));
    }
    if !review_explanation.is_empty() {
        body.push_str(&format!(
            "<div class=\"review-note\">{}<br>{}</div>\n",
            html_escape(&approval_msg),
            html_escape(&review_explanation)
        ));
    }

    for detail in &event_entries {
        body.push_str(&entry_html(detail, None));
    }

    if !event_sources.is_empty() {
        body.push_str("<h2>Sources</h2>\n<ul>\n");
        for source in &event_sources {
            body.push_str(&format!(
                "<li>[{}] <a href=\"{}\">{}</a></li>\n",
                source.kind.label(),
                html_escape(&source.url),
                html_escape(&source.title)
            ));
        }
        body.push_str("</ul>\n");
    }

    Ok(render_page(&event.name, &body))
}

/// GET /entries/:id
///
/// Redirect to the owning event page, anchored at the entry.
pub async fn view_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Redirect, PageError> {
    let entry_id = parse_id(&entry_id)?;
    let entry = entries::load_entry(&state.db, entry_id)
        .await?
        .ok_or_else(|| PageError::NotFound(format!("Entry {}", entry_id)))?;

    let event = events::load_event(&state.db, entry.event_id)
        .await?
        .ok_or_else(|| PageError::NotFound(format!("Event {}", entry.event_id)))?;

    Ok(Redirect::to(&format!(
        "{}#e{}",
        event_url(&event),
        entry.guid
    )))
}

/// Canonical URL of an event page
pub fn event_url(event: &Event) -> String {
    format!("/events/{}/{}", event.guid, slugify(&event.name))
}

/// Render one entry card (shared with the search results page)
pub fn entry_html(detail: &EntryDetail, event: Option<&Event>) -> String {
    let mut html = format!("<div class=\"entry\" id=\"e{}\">\n", detail.entry.guid);

    if let Some(event) = event {
        html.push_str(&format!(
            "<p><a href=\"{}#e{}\">{}</a> ({})</p>\n",
            event_url(event),
            detail.entry.guid,
            html_escape(&event.name),
            event.date
        ));
    }

    for line in &detail.lines {
        if line.speaker.is_empty() {
            html.push_str(&format!("<p>{}</p>\n", html_escape(&line.text)));
        } else {
            html.push_str(&format!(
                "<p><span class=\"speaker\">{}</span><br>{}</p>\n",
                html_escape(&line.speaker),
                html_escape(&line.text)
            ));
        }
    }

    if !detail.tags.is_empty() {
        html.push_str(&format!(
            "<p class=\"tags\">Tags: {}</p>\n",
            html_escape(&detail.tags.join(", "))
        ));
    }

    html.push_str("</div>\n");
    html
}

/// Render previous/next pagination links
///
/// `base_params` is the serialized non-page query string ("" for none).
pub fn pagination_nav(path: &str, base_params: &str, p: &Pagination) -> String {
    if p.total_pages <= 1 {
        return String::new();
    }

    let sep = if base_params.is_empty() { "" } else { "&" };
    let mut nav = String::from("<div class=\"pagination\">\n");

    if p.has_prev() {
        nav.push_str(&format!(
            "<a href=\"{}?{}{}page={}\">&laquo; previous</a>\n",
            path,
            base_params,
            sep,
            p.page - 1
        ));
    }
    nav.push_str(&format!(
        "<span>page {} of {}</span>\n",
        p.page, p.total_pages
    ));
    if p.has_next() {
        nav.push_str(&format!(
            "<a href=\"{}?{}{}page={}\">next &raquo;</a>\n",
            path,
            base_params,
            sep,
            p.page + 1
        ));
    }

    nav.push_str("</div>\n");
    nav
}

async fn load_visible_event(state: &AppState, raw_id: &str) -> Result<Event, PageError> {
    let event_id = parse_id(raw_id)?;
    let event = events::load_event(&state.db, event_id)
        .await?
        .ok_or_else(|| PageError::NotFound(format!("Event {}", event_id)))?;

    // Hidden entities are indistinguishable from absent ones
    if !event.visible() {
        return Err(PageError::NotFound(format!("Event {}", event_id)));
    }

    Ok(event)
}

fn parse_id(raw: &str) -> Result<Uuid, PageError> {
    Uuid::parse_str(raw).map_err(|_| PageError::NotFound(format!("Id {}", raw)))
}

/// Page errors
#[derive(Debug)]
pub enum PageError {
    NotFound(String),
    DatabaseError(String),
}

impl From<lorehall_common::Error> for PageError {
    fn from(e: lorehall_common::Error) -> Self {
        match e {
            lorehall_common::Error::NotFound(what) => PageError::NotFound(what),
            other => PageError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, title, message) = match self {
            PageError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "Not found",
                format!("{} does not exist in this archive.", what),
            ),
            PageError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error",
                format!("Database error: {}", msg),
            ),
        };

        let body = format!("<p>{}</p>", html_escape(&message));
        (status, render_page(title, &body)).into_response()
    }
}
