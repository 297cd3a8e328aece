//! Integration tests for the advanced search pipeline
//!
//! Covers the documented contract: conjunctive filter combination,
//! fail-closed evaluation, rank/date ordering, visibility rules, and
//! pagination clamping.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sqlx::SqlitePool;
use tower::util::ServiceExt;
use uuid::Uuid;

use lorehall_common::db::init::create_schema;
use lorehall_common::db::settings::init_default_settings;
use lorehall_web::{build_router, AppState};

/// Seeded search corpus
///
/// Two visible events, one hidden; entry ids are chosen so that assertions
/// can look for the `e<id>` anchors in the rendered page.
struct Corpus {
    pool: SqlitePool,
    /// 2017 event, one "spren" occurrence, tagged magic
    entry_one_spren: Uuid,
    /// 2017 event, "magic" text, tagged magic+history
    entry_magic_text: Uuid,
    /// 2019 event, three "spren" occurrences, event tagged history
    entry_three_spren: Uuid,
    /// Unapproved entry mentioning spren (must never surface)
    entry_unapproved: Uuid,
    /// Entry in a hidden event mentioning spren (must never surface)
    entry_hidden_event: Uuid,
}

async fn seed() -> Corpus {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    create_schema(&pool).await.unwrap();
    init_default_settings(&pool).await.unwrap();

    let event_2017 = Uuid::new_v4();
    let event_2019 = Uuid::new_v4();
    let event_hidden = Uuid::new_v4();

    for (guid, name, date, hidden) in [
        (event_2017, "Oathbringer Release", "2017-11-14", 0),
        (event_2019, "Starsight Signing", "2019-11-26", 0),
        (event_hidden, "Private Session", "2018-06-01", 1),
    ] {
        sqlx::query(
            "INSERT INTO events (guid, name, date, review_state, hidden)
             VALUES (?, ?, ?, 'approved', ?)",
        )
        .bind(guid.to_string())
        .bind(name)
        .bind(date)
        .bind(hidden)
        .execute(&pool)
        .await
        .unwrap();
    }

    let entry_one_spren = Uuid::new_v4();
    let entry_magic_text = Uuid::new_v4();
    let entry_three_spren = Uuid::new_v4();
    let entry_unapproved = Uuid::new_v4();
    let entry_hidden_event = Uuid::new_v4();

    for (guid, event, order, approved) in [
        (entry_one_spren, event_2017, 1, 1),
        (entry_magic_text, event_2017, 2, 1),
        (entry_three_spren, event_2019, 1, 1),
        (entry_unapproved, event_2019, 2, 0),
        (entry_hidden_event, event_hidden, 1, 1),
    ] {
        sqlx::query(
            "INSERT INTO entries (guid, event_id, display_order, approved, hidden)
             VALUES (?, ?, ?, ?, 0)",
        )
        .bind(guid.to_string())
        .bind(event.to_string())
        .bind(order)
        .bind(approved)
        .execute(&pool)
        .await
        .unwrap();
    }

    for (entry, speaker, text) in [
        (entry_one_spren, "Brandon Sanderson", "A spren is a cognitive entity."),
        (entry_magic_text, "Brandon Sanderson", "Magic systems follow rules."),
        (entry_three_spren, "Brandon Sanderson", "Spren, spren, and more spren."),
        (entry_unapproved, "Questioner", "Tell us about spren?"),
        (entry_hidden_event, "Brandon Sanderson", "Secret spren facts."),
    ] {
        sqlx::query(
            "INSERT INTO entry_lines (guid, entry_id, line_order, speaker, text)
             VALUES (?, ?, 1, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(entry.to_string())
        .bind(speaker)
        .bind(text)
        .execute(&pool)
        .await
        .unwrap();
    }

    let tag_magic = Uuid::new_v4();
    let tag_history = Uuid::new_v4();
    for (guid, name) in [(tag_magic, "magic"), (tag_history, "history")] {
        sqlx::query("INSERT INTO tags (guid, name) VALUES (?, ?)")
            .bind(guid.to_string())
            .bind(name)
            .execute(&pool)
            .await
            .unwrap();
    }

    for (tag, entry) in [
        (tag_magic, entry_one_spren),
        (tag_magic, entry_magic_text),
        (tag_history, entry_magic_text),
    ] {
        sqlx::query("INSERT INTO entry_tags (tag_id, entry_id) VALUES (?, ?)")
            .bind(tag.to_string())
            .bind(entry.to_string())
            .execute(&pool)
            .await
            .unwrap();
    }

    // Event-level tag: every visible entry of the 2019 event inherits it
    sqlx::query("INSERT INTO event_tags (tag_id, event_id) VALUES (?, ?)")
        .bind(tag_history.to_string())
        .bind(event_2019.to_string())
        .execute(&pool)
        .await
        .unwrap();

    Corpus {
        pool,
        entry_one_spren,
        entry_magic_text,
        entry_three_spren,
        entry_unapproved,
        entry_hidden_event,
    }
}

fn app(corpus: &Corpus) -> axum::Router {
    build_router(AppState::new(corpus.pool.clone()))
}

async fn search_page(corpus: &Corpus, uri: &str) -> (StatusCode, String) {
    let response = app(corpus)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn anchor(entry: Uuid) -> String {
    format!("id=\"e{}\"", entry)
}

#[tokio::test]
async fn no_active_filters_renders_form_without_results() {
    let corpus = seed().await;
    let (status, html) = search_page(&corpus, "/search").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("search-form"));
    assert!(!html.contains("results for"));

    // Empty parameters leave every filter inactive as well
    let (status, html) = search_page(&corpus, "/search?query=&tags=&speaker=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!html.contains("results for"));
}

#[tokio::test]
async fn text_filter_matches_and_ranks_by_occurrences() {
    let corpus = seed().await;
    let (status, html) = search_page(&corpus, "/search?query=spren").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("2 results"));

    // Both visible spren entries surface, highest occurrence count first
    let three = html.find(&anchor(corpus.entry_three_spren)).unwrap();
    let one = html.find(&anchor(corpus.entry_one_spren)).unwrap();
    assert!(three < one, "three-occurrence entry must rank first");

    // Entries failing the predicate or the visibility rules never surface
    assert!(!html.contains(&anchor(corpus.entry_magic_text)));
    assert!(!html.contains(&anchor(corpus.entry_unapproved)));
    assert!(!html.contains(&anchor(corpus.entry_hidden_event)));
}

#[tokio::test]
async fn filters_combine_conjunctively() {
    let corpus = seed().await;

    // spren AND tagged magic: only the 2017 spren entry carries the tag
    let (status, html) = search_page(&corpus, "/search?query=spren&tags=magic").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("1 results"));
    assert!(html.contains(&anchor(corpus.entry_one_spren)));
    assert!(!html.contains(&anchor(corpus.entry_three_spren)));
}

#[tokio::test]
async fn event_tags_apply_to_their_entries() {
    let corpus = seed().await;

    // history is a direct tag on one entry and an event tag covering another
    let (status, html) = search_page(&corpus, "/search?tags=history").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("2 results"));
    assert!(html.contains(&anchor(corpus.entry_magic_text)));
    assert!(html.contains(&anchor(corpus.entry_three_spren)));
}

#[tokio::test]
async fn unknown_tag_matches_nothing() {
    let corpus = seed().await;
    let (status, html) = search_page(&corpus, "/search?tags=nonexistent").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("0 results"));
}

#[tokio::test]
async fn speaker_filter_is_case_insensitive_substring() {
    let corpus = seed().await;
    let (status, html) = search_page(&corpus, "/search?speaker=sanderson").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(&anchor(corpus.entry_one_spren)));
    assert!(html.contains(&anchor(corpus.entry_magic_text)));
    assert!(html.contains(&anchor(corpus.entry_three_spren)));
    assert!(!html.contains(&anchor(corpus.entry_hidden_event)));
}

#[tokio::test]
async fn date_range_restricts_by_event_date() {
    let corpus = seed().await;

    let (status, html) =
        search_page(&corpus, "/search?query=spren&date_from=2019-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("1 results"));
    assert!(html.contains(&anchor(corpus.entry_three_spren)));

    let (status, html) =
        search_page(&corpus, "/search?query=spren&date_to=2018-12-31").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("1 results"));
    assert!(html.contains(&anchor(corpus.entry_one_spren)));
}

#[tokio::test]
async fn date_ordering_puts_newest_event_first() {
    let corpus = seed().await;
    let (status, html) = search_page(&corpus, "/search?query=spren&ordering=date").await;

    assert_eq!(status, StatusCode::OK);

    let three = html.find(&anchor(corpus.entry_three_spren)).unwrap();
    let one = html.find(&anchor(corpus.entry_one_spren)).unwrap();
    assert!(three < one, "2019 entry must precede 2017 entry");
}

#[tokio::test]
async fn unknown_ordering_falls_back_to_rank() {
    let corpus = seed().await;
    let (status, html) = search_page(&corpus, "/search?query=spren&ordering=sideways").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("ordered by rank"));
}

#[tokio::test]
async fn page_parameter_is_clamped() {
    let corpus = seed().await;

    // Non-numeric page falls back to the first page
    let (status, html) = search_page(&corpus, "/search?query=spren&page=banana").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("2 results"));

    // A page beyond the last clamps to the last page and still renders
    let (status, html) = search_page(&corpus, "/search?query=spren&page=9999").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("2 results"));
}

#[tokio::test]
async fn search_params_echo_active_filters_for_pagination() {
    let corpus = seed().await;
    let (status, html) =
        search_page(&corpus, "/search?query=spren&tags=magic&ordering=rank").await;

    assert_eq!(status, StatusCode::OK);
    // The form echoes the raw parameter values back to the user
    assert!(html.contains("value=\"spren\""));
    assert!(html.contains("value=\"magic\""));
}
