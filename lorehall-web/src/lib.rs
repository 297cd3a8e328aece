//! lorehall-web library - community knowledge-archive web application
//!
//! Serves event pages, entries, tagging, user settings, and advanced
//! search over the archived corpus.

use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod pagination;
pub mod search;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
///
/// Settings routes require a valid session; everything else is public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    // Protected routes (require a session)
    let protected = Router::new()
        .route(
            "/settings",
            get(api::settings_page).post(api::update_settings),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    // Public routes
    let public = Router::new()
        .route("/", get(api::index))
        .route("/events", get(api::events_list))
        .route("/events/:id", get(api::event_no_slug))
        .route("/events/:id/:slug", get(api::view_event))
        .route("/entries/:id", get(api::view_entry))
        .route("/search", get(api::adv_search))
        .route("/tags", get(api::tags_list))
        .route("/api/tags", get(api::get_tags))
        .route("/static/lorehall.css", get(api::serve_stylesheet))
        .merge(api::health_routes());

    // Combine routers
    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
